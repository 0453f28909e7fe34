//! Condition and Expression Translation
//!
//! Rewrites business-rule operators and literals into Python:
//!
//! | Business rule | Python |
//! |---|---|
//! | `a = b` (in conditions) | `a == b` |
//! | `a <> b` | `a != b` |
//! | `AND`, `&&` / `OR`, `\|\|` / `NOT`, `!x` | `and` / `or` / `not x` |
//! | `true` / `false` / `null` | `True` / `False` / `None` |
//! | `new Customer()` | `Customer()` |
//! | `tags contains "vip"` | `"vip" in tags` |
//!
//! String literals are never touched. Every rewrite is idempotent:
//! translating already-translated text returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::helpers::{find_top_level_words, map_code_segments};

static LOGICAL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(and|or)\b\s*").expect("valid regex"));
static NOT_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnot\b\s*").expect("valid regex"));
static TRUE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btrue\b").expect("valid regex"));
static FALSE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfalse\b").expect("valid regex"));
static NULL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(null|nil|none)\b").expect("valid regex"));
static NEW_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnew\s+([A-Za-z_][A-Za-z0-9_.]*)\s*\(").expect("valid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Translate a condition: equality `=` becomes `==`, then the expression
/// rewrites apply.
pub fn translate_condition(text: &str) -> String {
    let with_equality = map_code_segments(text.trim(), |seg| rewrite_equality(&seg.replace("<>", "!=")));
    translate_expression(&with_equality)
}

/// Translate an expression used as a value (assignment right-hand side,
/// call argument, return value). A lone `=` is left alone.
pub fn translate_expression(text: &str) -> String {
    let rewritten = map_code_segments(text.trim(), rewrite_operators);
    rewrite_contains(rewritten.trim())
}

fn rewrite_equality(seg: &str) -> String {
    let chars: Vec<char> = seg.chars().collect();
    let mut out = String::with_capacity(seg.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '=' {
            let prev = if i > 0 { chars[i - 1] } else { ' ' };
            let next = chars.get(i + 1).copied().unwrap_or(' ');
            let part_of_operator = matches!(prev, '=' | '!' | '<' | '>') || next == '=' || next == '>';
            if !part_of_operator {
                out.push_str("==");
                continue;
            }
        }
        out.push(c);
    }

    out
}

fn rewrite_bang(seg: &str) -> String {
    let chars: Vec<char> = seg.chars().collect();
    let mut out = String::with_capacity(seg.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '!' && chars.get(i + 1) != Some(&'=') {
            out.push_str(" not ");
            continue;
        }
        out.push(c);
    }

    out
}

fn rewrite_operators(seg: &str) -> String {
    let mut s = seg.replace("<>", "!=").replace("&&", " and ").replace("||", " or ");
    s = rewrite_bang(&s);
    s = LOGICAL_WORD
        .replace_all(&s, |caps: &regex::Captures<'_>| format!(" {} ", caps[1].to_lowercase()))
        .into_owned();
    s = NOT_WORD.replace_all(&s, "not ").into_owned();
    s = TRUE_WORD.replace_all(&s, "True").into_owned();
    s = FALSE_WORD.replace_all(&s, "False").into_owned();
    s = NULL_WORD.replace_all(&s, "None").into_owned();
    s = NEW_CALL.replace_all(&s, "$1(").into_owned();
    // `not (` and `( not` both collapse to single spaces.
    s = s.replace("( ", "(");
    SPACES.replace_all(&s, " ").into_owned()
}

/// Offsets of `contains` used as an infix operator. Method calls
/// (`tags.contains(x)`) and a bare `contains(...)` call are not operators.
fn contains_operator_hits(expr: &str) -> Vec<usize> {
    let bytes = expr.as_bytes();
    find_top_level_words(expr, "contains")
        .into_iter()
        .filter(|&pos| {
            let after_dot = pos > 0 && bytes[pos - 1] == b'.';
            let called = bytes.get(pos + "contains".len()) == Some(&b'(');
            !after_dot && !called
        })
        .collect()
}

/// `lhs contains rhs` → `rhs in lhs`, clause by clause
fn rewrite_contains(expr: &str) -> String {
    if contains_operator_hits(expr).is_empty() {
        return expr.to_string();
    }

    let mut cuts: Vec<(usize, usize)> = Vec::new();
    for word in ["and", "or"] {
        for pos in find_top_level_words(expr, word) {
            cuts.push((pos, pos + word.len()));
        }
    }
    cuts.sort_unstable();

    let mut out = String::with_capacity(expr.len());
    let mut start = 0usize;
    for (cut_start, cut_end) in cuts {
        out.push_str(&rewrite_contains_clause(&expr[start..cut_start]));
        out.push_str(&expr[cut_start..cut_end]);
        start = cut_end;
    }
    out.push_str(&rewrite_contains_clause(&expr[start..]));

    out
}

/// Chains fold to the left: `a contains b contains c` → `c in (b in a)`
fn rewrite_contains_clause(clause: &str) -> String {
    let leading: String = clause.chars().take_while(|c| c.is_whitespace()).collect();
    let trailing: String = clause
        .chars()
        .rev()
        .take_while(|c| c.is_whitespace())
        .collect();
    let body = clause.trim();

    let hits = contains_operator_hits(body);
    if hits.is_empty() {
        return clause.to_string();
    }

    let mut operands = Vec::with_capacity(hits.len() + 1);
    let mut start = 0usize;
    for &pos in &hits {
        operands.push(body[start..pos].trim());
        start = pos + "contains".len();
    }
    operands.push(body[start..].trim());

    let mut first = operands[0];
    let negated = match first.strip_prefix("not ") {
        Some(rest) => {
            first = rest.trim();
            true
        }
        None => false,
    };
    if first.is_empty() || operands[1..].iter().any(|o| o.is_empty()) {
        return clause.to_string();
    }

    let last = operands.len() - 1;
    let mut folded = first.to_string();
    for (idx, operand) in operands.iter().enumerate().skip(1) {
        let op = if negated && idx == last { "not in" } else { "in" };
        let container = if idx > 1 { format!("({})", folded) } else { folded };
        folded = format!("{} {} {}", operand, op, container);
    }

    format!("{}{}{}", leading, folded, trailing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality() {
        assert_eq!(translate_condition("testcls.age = 4"), "testcls.age == 4");
        assert_eq!(translate_condition("a == b"), "a == b");
        assert_eq!(translate_condition("a <> b"), "a != b");
        assert_eq!(translate_condition("a >= 1 and b <= 2"), "a >= 1 and b <= 2");
        assert_eq!(translate_condition("a > 1 or b < 2"), "a > 1 or b < 2");
    }

    #[test]
    fn test_logical_words_normalized() {
        assert_eq!(translate_condition("a = 1   AND b = 2"), "a == 1 and b == 2");
        assert_eq!(translate_condition("a && b || c"), "a and b or c");
        assert_eq!(translate_condition("NOT done"), "not done");
        assert_eq!(translate_condition("!done"), "not done");
        assert_eq!(translate_condition("a != b"), "a != b");
    }

    #[test]
    fn test_strings_untouched() {
        assert_eq!(translate_condition("name = \"a = b and c\""), "name == \"a = b and c\"");
        assert_eq!(translate_condition("note <> 'x<>y'"), "note != 'x<>y'");
    }

    #[test]
    fn test_literals() {
        assert_eq!(translate_expression("true"), "True");
        assert_eq!(translate_expression("[false, null]"), "[False, None]");
        assert_eq!(translate_expression("new Customer(\"A\")"), "Customer(\"A\")");
        assert_eq!(translate_expression("isTrue"), "isTrue");
    }

    #[test]
    fn test_contains() {
        assert_eq!(translate_condition("tags contains \"vip\""), "\"vip\" in tags");
        assert_eq!(
            translate_condition("a = 1 and tags contains \"vip\""),
            "a == 1 and \"vip\" in tags"
        );
        assert_eq!(translate_condition("not tags contains x"), "x not in tags");
        assert_eq!(translate_condition("a contains b contains c"), "c in (b in a)");
    }

    #[test]
    fn test_contains_method_call_untouched() {
        assert_eq!(translate_condition("tags.contains(x)"), "tags.contains(x)");
        assert_eq!(
            translate_expression("name.contains(\"A\") && ok"),
            "name.contains(\"A\") and ok"
        );
        assert_eq!(
            translate_condition("list.contains(a) and tags contains b"),
            "list.contains(a) and b in tags"
        );
    }

    #[test]
    fn test_expression_keeps_single_equals_alone() {
        assert_eq!(translate_expression("f(a = 1)"), "f(a = 1)");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "testcls.age = 4",
            "a <> b AND c >= 3",
            "!ready || count <= 0",
            "tags contains \"x\" or not flag",
            "name = \"a = b\" and x = true",
            "not tags contains x",
            "new Order(1) = null",
            "(a = 1) and (b <> 2)",
            "NOT (a OR b)",
            "a contains b contains c",
            "not a contains b contains c",
            "items.contains(x) or y contains z",
        ];
        for sample in samples {
            let once = translate_condition(sample);
            let twice = translate_condition(&once);
            assert_eq!(once, twice, "not idempotent for `{}`", sample);
        }
    }
}
