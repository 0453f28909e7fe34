//! Helper utility functions for the business-rule transpiler
//!
//! String-aware scanning used throughout the pipeline:
//! - Comment stripping and comment-line detection
//! - Indentation width
//! - Bracket balance outside string literals
//! - Top-level `=` / `,` search
//! - Identifier validation
//! - Python string literal quoting

/// Indentation width of the generated Python, and the width a tab counts
/// for when measuring business-rule indentation.
pub const INDENT_WIDTH: usize = 4;

/// Walk `s` and call `visit` with (byte index, char, in_string) for every
/// character. Both `"` and `'` delimit strings (quotes themselves count as
/// inside); backslash escapes apply inside strings only. The visitor stops
/// the walk by returning false. Returns true when the text ends inside an
/// unterminated string literal.
fn scan_chars(s: &str, mut visit: impl FnMut(usize, char, bool) -> bool) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            if !visit(i, c, true) {
                return false;
            }
            continue;
        }

        if c == '"' || c == '\'' {
            quote = Some(c);
            if !visit(i, c, true) {
                return false;
            }
            continue;
        }

        if !visit(i, c, false) {
            return false;
        }
    }

    quote.is_some()
}

/// Strip a trailing `//` comment from a line, preserving string literals
pub fn strip_inline_comment(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut cut = line.len();

    scan_chars(line, |i, c, in_string| {
        if !in_string && c == '/' && bytes.get(i + 1) == Some(&b'/') {
            cut = i;
            return false;
        }
        true
    });

    line[..cut].trim_end().to_string()
}

/// Is this (trimmed) line a whole-line comment?
pub fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with('#')
}

/// Text of a whole-line comment without its marker
pub fn comment_text(trimmed: &str) -> &str {
    trimmed
        .strip_prefix("//")
        .or_else(|| trimmed.strip_prefix('#'))
        .unwrap_or(trimmed)
        .trim()
}

/// The code part of a line: trimmed, with comments removed.
/// Whole-line comments yield an empty string.
pub fn code_part(line: &str) -> String {
    let trimmed = line.trim();
    if is_comment_line(trimmed) {
        return String::new();
    }
    strip_inline_comment(trimmed)
}

/// Width of the leading whitespace. Tabs count as [`INDENT_WIDTH`].
pub fn leading_whitespace_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { INDENT_WIDTH } else { 1 })
        .sum()
}

/// `(` count minus `)` count, ignoring string contents
pub fn paren_balance(s: &str) -> i32 {
    let mut balance = 0;
    scan_chars(s, |_, c, in_string| {
        if !in_string {
            match c {
                '(' => balance += 1,
                ')' => balance -= 1,
                _ => {}
            }
        }
        true
    });
    balance
}

/// `{` count minus `}` count, ignoring string contents
pub fn brace_balance(s: &str) -> i32 {
    let mut balance = 0;
    scan_chars(s, |_, c, in_string| {
        if !in_string {
            match c {
                '{' => balance += 1,
                '}' => balance -= 1,
                _ => {}
            }
        }
        true
    });
    balance
}

/// Byte offset of the first `target` outside string literals
pub fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut found = None;
    scan_chars(s, |i, c, in_string| {
        if !in_string && c == target {
            found = Some(i);
            return false;
        }
        true
    });
    found
}

/// Byte offset of the last `target` outside string literals
pub fn rfind_unquoted(s: &str, target: char) -> Option<usize> {
    let mut found = None;
    scan_chars(s, |i, c, in_string| {
        if !in_string && c == target {
            found = Some(i);
        }
        true
    });
    found
}

/// Do `()`, `[]` and `{}` nest correctly outside string literals?
/// An unterminated string also counts as unbalanced.
pub fn brackets_balanced(s: &str) -> bool {
    let mut stack: Vec<char> = Vec::new();
    let mut ok = true;

    let open_string = scan_chars(s, |_, c, in_string| {
        if in_string {
            return true;
        }
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    ok = false;
                    return false;
                }
            }
            _ => {}
        }
        true
    });

    ok && stack.is_empty() && !open_string
}

/// Split on `sep` at bracket depth zero, outside string literals.
/// Parts are trimmed; empty parts are dropped.
pub fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;

    scan_chars(s, |i, c, in_string| {
        if in_string {
            return true;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ if c == sep && depth == 0 => {
                parts.push(s[start..i].trim().to_string());
                start = i + c.len_utf8();
            }
            _ => {}
        }
        true
    });
    parts.push(s[start..].trim().to_string());

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Byte offsets of `word` (ASCII, case-insensitive) occurring as a whole
/// word at bracket depth zero, outside string literals
pub fn find_top_level_words(s: &str, word: &str) -> Vec<usize> {
    let bytes = s.as_bytes();
    let is_word_byte = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut hits = Vec::new();
    let mut depth = 0i32;

    scan_chars(s, |i, c, in_string| {
        if in_string {
            return true;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ if depth == 0 => {
                let end = i + word.len();
                let matches = end <= bytes.len()
                    && bytes[i..end].eq_ignore_ascii_case(word.as_bytes())
                    && (i == 0 || !is_word_byte(bytes[i - 1]))
                    && (end == bytes.len() || !is_word_byte(bytes[end]));
                if matches {
                    hits.push(i);
                }
            }
            _ => {}
        }
        true
    });

    hits
}

/// Find the assignment operator of a statement at bracket depth zero.
///
/// Returns the byte offset and the operator (`=`, `+=`, `-=`, `*=`, `/=`).
/// Comparison operators (`==`, `!=`, `<=`, `>=`, `<>`) are never matched.
pub fn find_assignment_op(s: &str) -> Option<(usize, &'static str)> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut found: Option<(usize, &'static str)> = None;

    scan_chars(s, |i, c, in_string| {
        if in_string {
            return true;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { b' ' };
                let next = bytes.get(i + 1).copied().unwrap_or(b' ');
                if next == b'=' || prev == b'=' || prev == b'!' || prev == b'<' || prev == b'>' {
                    return true;
                }
                found = match prev {
                    b'+' => Some((i - 1, "+=")),
                    b'-' => Some((i - 1, "-=")),
                    b'*' => Some((i - 1, "*=")),
                    b'/' => Some((i - 1, "/=")),
                    _ => Some((i, "=")),
                };
                return false;
            }
            _ => {}
        }
        true
    });

    found
}

/// Check if a string is a valid identifier
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Check if a string can be assigned to: `name`, `a.b.c`, `items[0]`, `a.b[i].c`
pub fn is_assignment_target(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || !brackets_balanced(s) {
        return false;
    }
    // Drop index expressions, then every dotted segment must be an identifier.
    let mut flat = String::new();
    let mut depth = 0;
    for c in s.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ if depth == 0 => flat.push(c),
            _ => {}
        }
    }
    flat.split('.').all(is_valid_identifier)
}

/// Is `word` the last whole word of `s`?
pub fn ends_with_word(s: &str, word: &str) -> bool {
    match s.strip_suffix(word) {
        Some(rest) => rest
            .chars()
            .last()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_')),
        None => false,
    }
}

/// Apply `f` to every run of text outside string literals; string literals
/// are copied through untouched.
pub fn map_code_segments(s: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(s.len());
    let mut seg_start = 0usize;
    let mut seg_in_string = false;
    let mut first = true;

    let mut flush = |out: &mut String, text: &str, in_string: bool| {
        if in_string {
            out.push_str(text);
        } else {
            out.push_str(&f(text));
        }
    };

    scan_chars(s, |i, _, in_string| {
        if first {
            seg_in_string = in_string;
            first = false;
        } else if in_string != seg_in_string {
            flush(&mut out, &s[seg_start..i], seg_in_string);
            seg_start = i;
            seg_in_string = in_string;
        }
        true
    });
    if seg_start < s.len() {
        flush(&mut out, &s[seg_start..], seg_in_string);
    }

    out
}

/// Quote text as a Python double-quoted string literal
pub fn py_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Is the (trimmed) text a string literal?
pub fn is_string_literal(s: &str) -> bool {
    let s = s.trim();
    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
}

/// Is the (trimmed) text a numeric literal? Must start with a digit or
/// `.digit`, so `inf` and `nan` are names.
pub fn is_number_literal(s: &str) -> bool {
    let s = s.trim();
    let s = s.strip_prefix('-').unwrap_or(s);
    let digit_led = match s.as_bytes() {
        [first, ..] if first.is_ascii_digit() => true,
        [b'.', second, ..] => second.is_ascii_digit(),
        _ => false,
    };
    digit_led && s.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inline_comment() {
        assert_eq!(strip_inline_comment("x = 1 // note"), "x = 1");
        assert_eq!(strip_inline_comment("url = \"http://a\""), "url = \"http://a\"");
    }

    #[test]
    fn test_code_part_of_comment_line() {
        assert_eq!(code_part("   # just a note,"), "");
        assert_eq!(code_part("  // another"), "");
        assert_eq!(code_part("  y = 2  "), "y = 2");
    }

    #[test]
    fn test_leading_whitespace_width() {
        assert_eq!(leading_whitespace_width("    x"), 4);
        assert_eq!(leading_whitespace_width("\tx"), 4);
        assert_eq!(leading_whitespace_width("x"), 0);
    }

    #[test]
    fn test_paren_balance_ignores_strings() {
        assert_eq!(paren_balance("hello(a, \")\""), 1);
        assert_eq!(paren_balance("f(g(x))"), 0);
    }

    #[test]
    fn test_brackets_balanced() {
        assert!(brackets_balanced("f([1, 2], {\"a\": 1})"));
        assert!(!brackets_balanced("f([1, 2)"));
        assert!(!brackets_balanced("x = \"open"));
        assert!(brackets_balanced("x = \"(\""));
    }

    #[test]
    fn test_find_assignment_op() {
        assert_eq!(find_assignment_op("x = 5"), Some((2, "=")));
        assert_eq!(find_assignment_op("total += 1"), Some((6, "+=")));
        assert_eq!(find_assignment_op("a == b"), None);
        assert_eq!(find_assignment_op("a <= b"), None);
        assert_eq!(find_assignment_op("f(a = 1)"), None);
        assert_eq!(find_assignment_op("s = \"a=b\""), Some((2, "=")));
    }

    #[test]
    fn test_assignment_target() {
        assert!(is_assignment_target("newCls.age"));
        assert!(is_assignment_target("items[0].name"));
        assert!(!is_assignment_target("if x"));
        assert!(!is_assignment_target("f(x)"));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("a, f(b, c), \"d,e\"", ','), vec!["a", "f(b, c)", "\"d,e\""]);
    }

    #[test]
    fn test_ends_with_word() {
        assert!(ends_with_word("a and", "and"));
        assert!(!ends_with_word("x = band", "and"));
        assert!(ends_with_word("or", "or"));
    }

    #[test]
    fn test_map_code_segments() {
        let out = map_code_segments("a <> \"<>\" and b <> c", |seg| seg.replace("<>", "!="));
        assert_eq!(out, "a != \"<>\" and b != c");
    }

    #[test]
    fn test_py_string_literal() {
        assert_eq!(py_string_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_number_literal() {
        assert!(is_number_literal("42"));
        assert!(is_number_literal("-3.5"));
        assert!(is_number_literal(".5"));
        assert!(is_number_literal("1e3"));
        assert!(!is_number_literal("inf"));
        assert!(!is_number_literal("NaN"));
        assert!(!is_number_literal("-infinity"));
        assert!(!is_number_literal(""));
    }

    #[test]
    fn test_brace_scanning() {
        assert_eq!(brace_balance("class A { x = \"{\""), 1);
        assert_eq!(find_unquoted("a = \"{\" {", '{'), Some(8));
        assert_eq!(rfind_unquoted("{ a } }", '}'), Some(6));
        assert_eq!(find_unquoted("\"}\"", '}'), None);
    }
}
