//! Business-Rule Parser - Converts statement groups to a statement tree
//!
//! Two passes:
//! 1. **Classification**: every [`StatementGroup`] becomes one
//!    [`Statement`]. Declarations (`class`, `enum`, `interface`) absorb the
//!    groups of their body, either a `{ ... }` block or an indented block.
//! 2. **Tree building**: statements are nested by indentation. A
//!    more-indented statement becomes a child of the nearest preceding
//!    block header; indentation under anything else is an error.
//!
//! Keywords are matched case-insensitively. Conditions and expressions are
//! stored as written; the generator translates them.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::*;
use crate::continuation::{dangling_operator, INCOMPLETE_FUNCTION_CALL, INCOMPLETE_IF_STATEMENT};
use crate::error_msg::{ErrorCode, Result, TranspileError};
use crate::grouping::StatementGroup;
use crate::helpers::{
    brace_balance, brackets_balanced, comment_text, find_assignment_op, find_top_level_words,
    find_unquoted, is_assignment_target, is_comment_line, is_valid_identifier, rfind_unquoted,
    split_top_level,
};
use crate::indentation::{is_if_any, IfAnyHeader};

static FOR_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:for)\s+(?:(?i:each)\s+)?([A-Za-z_]\w*)\s+(?i:in)\s+(.+)$").expect("valid regex")
});
static FOR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:for)\s+([A-Za-z_]\w*)\s*=\s*(.+?)\s+(?i:to)\s+(.+?)(?:\s+(?i:step)\s+(.+))?$")
        .expect("valid regex")
});
static INTERFACE_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_]\w*)\s*\((.*)\)\s*(?::\s*(.+))?$").expect("valid regex")
});

/// Keywords that may be followed directly by `(`
const PAREN_KEYWORDS: &[&str] = &["if", "elseif", "elif", "while", "switch", "for"];

//=============================================================================
// PARSED PROGRAM
//=============================================================================

/// Statement tree of a whole business rule
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedProgram {
    pub nodes: Vec<Node>,
    /// Non-fatal findings (incomplete statements when they are allowed)
    pub warnings: Vec<String>,
}

impl ParsedProgram {
    /// Business-rule lines covered by all statements
    pub fn total_lines(&self) -> usize {
        self.nodes.iter().map(Node::total_lines).sum()
    }
}

/// Parse grouped statements into a tree.
///
/// With `reject_incomplete`, an incomplete group is a `BR003` error;
/// otherwise it is reported as a warning and parsed as written. A
/// statement that still ends on an operator is always `BR003`.
pub fn parse_program(groups: &[StatementGroup], reject_incomplete: bool) -> Result<ParsedProgram> {
    let mut statements = Vec::with_capacity(groups.len());
    let mut warnings = Vec::new();
    let mut idx = 0;

    while idx < groups.len() {
        let group = &groups[idx];

        if !group.is_complete {
            let reason = incomplete_reason(group);
            if reject_incomplete {
                return Err(TranspileError::incomplete(group.start_line, reason));
            }
            warnings.push(format!(
                "line {}: incomplete statement ({}), translated as written",
                group.start_line, reason
            ));
        }

        let code = group.joined_code();
        if let Some(keyword) = declaration_keyword(&code) {
            let (statement, consumed) = parse_declaration(keyword, &groups[idx..])?;
            statements.push(statement);
            idx += consumed;
            continue;
        }

        if let Some(reason) = dangling_operator(&code) {
            return Err(TranspileError::incomplete(group.start_line, reason));
        }

        statements.push(parse_statement(group)?);
        idx += 1;
    }

    let nodes = build_tree(statements)?;
    Ok(ParsedProgram { nodes, warnings })
}

fn incomplete_reason(group: &StatementGroup) -> &str {
    group
        .continuation_reasons
        .iter()
        .find(|r| r.as_str() == INCOMPLETE_FUNCTION_CALL || r.as_str() == INCOMPLETE_IF_STATEMENT)
        .map_or(INCOMPLETE_FUNCTION_CALL, |r| r.as_str())
}

//=============================================================================
// TREE BUILDING
//=============================================================================

/// Nest statements by indentation
pub fn build_tree(statements: Vec<Statement>) -> Result<Vec<Node>> {
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<Node> = Vec::new();

    for statement in statements {
        let is_comment = matches!(statement.kind, StatementKind::Comment { .. });

        // Close every open node that cannot own this statement. A comment
        // never triggers an indentation error; it attaches to the nearest
        // enclosing block instead.
        while let Some(top) = stack.last() {
            let closes = top.statement.indent >= statement.indent
                || (is_comment && !top.kind().opens_block());
            if !closes {
                break;
            }
            if let Some(node) = stack.pop() {
                attach(&mut stack, &mut roots, node);
            }
        }

        if let Some(parent) = stack.last() {
            if !parent.kind().opens_block() {
                return Err(TranspileError::unexpected_indent(
                    statement.line(),
                    &parent.statement.source,
                ));
            }
        }

        stack.push(Node::new(statement));
    }

    while let Some(node) = stack.pop() {
        attach(&mut stack, &mut roots, node);
    }

    Ok(roots)
}

fn attach(stack: &mut [Node], roots: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

//=============================================================================
// STATEMENT CLASSIFICATION
//=============================================================================

/// Lowercased leading keyword of a statement, if the first word is one.
/// `total = 1` has no keyword even though `total` is a word.
fn keyword_of(code: &str) -> Option<String> {
    let end = code
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(code.len());
    if end == 0 {
        return None;
    }
    let word = code[..end].to_lowercase();
    let next = code[end..].chars().next();

    match next {
        None => Some(word),
        Some(c) if c.is_whitespace() => {
            let rest = code[end..].trim_start();
            let assigns = rest.starts_with('=') && !rest.starts_with("==");
            let compound = ["+=", "-=", "*=", "/="].iter().any(|op| rest.starts_with(op));
            if assigns || compound {
                None
            } else {
                Some(word)
            }
        }
        Some('(') if PAREN_KEYWORDS.contains(&word.as_str()) => Some(word),
        _ => None,
    }
}

fn declaration_keyword(code: &str) -> Option<&'static str> {
    match keyword_of(code)?.as_str() {
        "class" => Some("class"),
        "enum" => Some("enum"),
        "interface" => Some("interface"),
        _ => None,
    }
}

/// Text after the leading keyword (and an optional second keyword word)
fn after_keyword<'a>(code: &'a str, words: usize) -> &'a str {
    let mut rest = code.trim();
    for _ in 0..words {
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest.trim()
}

/// Drop a trailing marker word such as `then` or `do`
fn strip_trailing_word<'a>(text: &'a str, word: &str) -> &'a str {
    let text = text.trim();
    let lower = text.to_lowercase();
    if lower == word {
        return "";
    }
    let suffix = format!(" {}", word);
    if lower.ends_with(&suffix) {
        text[..text.len() - suffix.len()].trim_end()
    } else {
        text
    }
}

fn require_condition(condition: &str, line: usize, what: &str) -> Result<String> {
    if condition.is_empty() {
        return Err(TranspileError::syntax(
            line,
            ErrorCode::BR023,
            format!("`{}` is missing its condition", what),
        ));
    }
    Ok(condition.to_string())
}

/// Classify one statement group
pub fn parse_statement(group: &StatementGroup) -> Result<Statement> {
    let line = group.start_line;
    let code = group.joined_code();
    let source = group.joined_text();

    let make = |kind: StatementKind| Statement {
        kind,
        span: Span::new(group.start_line, group.end_line),
        indent: group.indent(),
        line_count: group.line_count(),
        source: source.clone(),
    };

    if code.is_empty() {
        let first = group.lines.first().map_or("", |l| l.trimmed.as_str());
        let text = if is_comment_line(first) { comment_text(first) } else { first };
        return Ok(make(StatementKind::Comment { text: text.to_string() }));
    }

    if let Some(keyword) = declaration_keyword(&code) {
        let (statement, _) = parse_declaration(keyword, std::slice::from_ref(group))?;
        return Ok(statement);
    }

    if !brackets_balanced(&code) {
        return Err(TranspileError::unbalanced(line, &code));
    }

    let kind = classify(&code, line)?;
    log::debug!("line {}: {} statement", line, kind.name());
    Ok(make(kind))
}

fn classify(code: &str, line: usize) -> Result<StatementKind> {
    let keyword = keyword_of(code);

    match keyword.as_deref() {
        Some("if") if is_if_any(code) => {
            let header = IfAnyHeader::parse(code, line)?;
            Ok(StatementKind::IfAny {
                item: header.item,
                collection: header.collection,
                condition: header.condition,
            })
        }
        Some("if") => {
            let condition = strip_trailing_word(after_keyword(code, 1), "then");
            Ok(StatementKind::If { condition: require_condition(condition, line, "if")? })
        }
        Some("elseif") | Some("elif") => {
            let condition = strip_trailing_word(after_keyword(code, 1), "then");
            Ok(StatementKind::ElseIf { condition: require_condition(condition, line, "elseif")? })
        }
        Some("else") => {
            let rest = after_keyword(code, 1);
            if rest.is_empty() {
                return Ok(StatementKind::Else);
            }
            if keyword_of(rest).as_deref() == Some("if") {
                let condition = strip_trailing_word(after_keyword(rest, 1), "then");
                return Ok(StatementKind::ElseIf {
                    condition: require_condition(condition, line, "else if")?,
                });
            }
            Err(TranspileError::unrecognized(line, code))
        }
        Some("for") => parse_for(code, line),
        Some("while") => {
            let condition = strip_trailing_word(after_keyword(code, 1), "do");
            Ok(StatementKind::While { condition: require_condition(condition, line, "while")? })
        }
        Some("switch") => {
            let subject = after_keyword(code, 1);
            Ok(StatementKind::Switch { subject: require_condition(subject, line, "switch")? })
        }
        Some("case") => {
            let values = split_top_level(after_keyword(code, 1).trim_end_matches(':'), ',');
            if values.is_empty() {
                return Err(TranspileError::syntax(line, ErrorCode::BR023, "`case` without a value"));
            }
            Ok(StatementKind::Case { values })
        }
        Some("default") if after_keyword(code, 1).trim_end_matches(':').is_empty() => {
            Ok(StatementKind::Default)
        }
        Some("return") => {
            let value = after_keyword(code, 1);
            Ok(StatementKind::Return {
                value: if value.is_empty() { None } else { Some(value.to_string()) },
            })
        }
        Some("break") if after_keyword(code, 1).is_empty() => Ok(StatementKind::Break),
        Some("continue") if after_keyword(code, 1).is_empty() => Ok(StatementKind::Continue),
        Some("pass") if after_keyword(code, 1).is_empty() => Ok(StatementKind::Pass),
        _ => classify_simple(code, line),
    }
}

fn parse_for(code: &str, line: usize) -> Result<StatementKind> {
    let code = strip_trailing_word(code, "do");

    if let Some(caps) = FOR_RANGE.captures(code) {
        return Ok(StatementKind::For {
            variable: caps[1].to_string(),
            iterable: ForIterable::Range {
                start: caps[2].trim().to_string(),
                end: caps[3].trim().to_string(),
                step: caps.get(4).map(|m| m.as_str().trim().to_string()),
            },
        });
    }

    if let Some(caps) = FOR_IN.captures(code) {
        return Ok(StatementKind::For {
            variable: caps[1].to_string(),
            iterable: ForIterable::Collection { expr: caps[2].trim().to_string() },
        });
    }

    Err(TranspileError::syntax(
        line,
        ErrorCode::BR021,
        format!(
            "malformed `for` (expected `for <var> in <expr>` or `for <var> = <start> to <end>`): `{}`",
            code
        ),
    ))
}

/// Assignments, SQL assignments and call statements
fn classify_simple(code: &str, line: usize) -> Result<StatementKind> {
    if let Some((pos, op)) = find_assignment_op(code) {
        let target = code[..pos].trim();
        let value = code[pos + op.len()..].trim();

        if !is_assignment_target(target) {
            return Err(TranspileError::syntax(
                line,
                ErrorCode::BR060,
                format!("invalid assignment target `{}`", target),
            ));
        }
        if value.is_empty() {
            return Err(TranspileError::syntax(
                line,
                ErrorCode::BR060,
                format!("assignment to `{}` has no value", target),
            ));
        }

        if op == "=" && is_sql_query(value) {
            return Ok(StatementKind::SqlAssignment {
                target: target.to_string(),
                query: value.to_string(),
            });
        }

        return Ok(StatementKind::Assignment {
            target: target.to_string(),
            op: op.to_string(),
            value: value.to_string(),
        });
    }

    if is_call(code) {
        return Ok(StatementKind::Expression { text: code.to_string() });
    }

    Err(TranspileError::unrecognized(line, code))
}

fn is_sql_query(value: &str) -> bool {
    let lower = value.trim_start().to_lowercase();
    lower.starts_with("select ")
}

/// `name(...)`, `obj.method(...)`, `a.b(1).c(2)`
fn is_call(code: &str) -> bool {
    if !code.ends_with(')') {
        return false;
    }
    match find_unquoted(code, '(') {
        Some(open) => is_assignment_target(&code[..open]),
        None => false,
    }
}

//=============================================================================
// DECLARATIONS
//=============================================================================

/// A member text with the business-rule line it came from
#[derive(Debug)]
struct MemberChunk {
    line: usize,
    text: String,
}

struct DeclHead {
    name: String,
    extends: Vec<String>,
    implements: Vec<String>,
}

/// Parse a declaration starting at `groups[0]`. Returns the statement and
/// the number of groups it consumed.
fn parse_declaration(keyword: &'static str, groups: &[StatementGroup]) -> Result<(Statement, usize)> {
    let header = &groups[0];
    let line = header.start_line;
    let header_code = header.joined_code();
    let error_code = match keyword {
        "class" => ErrorCode::BR040,
        "enum" => ErrorCode::BR041,
        _ => ErrorCode::BR042,
    };

    let braced = find_unquoted(&header_code, '{').is_some()
        || groups
            .get(1)
            .map_or(false, |g| g.joined_code().starts_with('{') && g.indent() <= header.indent());

    let head_text = match find_unquoted(&header_code, '{') {
        Some(open) => header_code[..open].trim(),
        None => header_code.trim(),
    };
    let head = parse_decl_head(head_text, line, error_code)?;

    let (chunks, consumed) = if braced {
        collect_braced_body(groups, keyword)?
    } else {
        collect_indented_body(groups)
    };

    let consumed_groups = &groups[..consumed];
    let line_count = consumed_groups.iter().map(StatementGroup::line_count).sum();
    let end_line = consumed_groups.last().map_or(header.end_line, |g| g.end_line);

    let kind = match keyword {
        "class" => StatementKind::ClassDecl(ClassDecl {
            name: head.name,
            extends: head.extends,
            implements: head.implements,
            members: chunks
                .iter()
                .map(parse_class_member)
                .collect::<Result<Vec<_>>>()?,
        }),
        "enum" => StatementKind::EnumDecl(EnumDecl {
            name: head.name,
            variants: chunks
                .iter()
                .map(parse_enum_variant)
                .collect::<Result<Vec<_>>>()?,
        }),
        _ => StatementKind::InterfaceDecl(InterfaceDecl {
            name: head.name,
            extends: head.extends,
            members: chunks
                .iter()
                .map(parse_interface_member)
                .collect::<Result<Vec<_>>>()?,
        }),
    };

    log::debug!(
        "line {}: {} declaration spanning {} group(s)",
        line,
        keyword,
        consumed
    );

    Ok((
        Statement {
            kind,
            span: Span::new(line, end_line),
            indent: header.indent(),
            line_count,
            source: header.joined_text(),
        },
        consumed,
    ))
}

/// `class Name extends A implements B, C`
fn parse_decl_head(head: &str, line: usize, code: ErrorCode) -> Result<DeclHead> {
    let rest = after_keyword(head, 1);
    let extends_at = find_top_level_words(rest, "extends").first().copied();
    let implements_at = find_top_level_words(rest, "implements").first().copied();

    let name_end = [extends_at, implements_at]
        .iter()
        .flatten()
        .copied()
        .min()
        .unwrap_or(rest.len());
    let name = rest[..name_end].trim();
    if !is_valid_identifier(name) {
        return Err(TranspileError::syntax(
            line,
            code,
            format!("malformed declaration header `{}`", head.trim()),
        ));
    }

    let list_after = |start: Option<usize>, word: &str| -> Vec<String> {
        let start = match start {
            Some(s) => s + word.len(),
            None => return Vec::new(),
        };
        let end = [extends_at, implements_at]
            .iter()
            .flatten()
            .copied()
            .filter(|&p| p > start)
            .min()
            .unwrap_or(rest.len());
        split_top_level(&rest[start..end], ',')
    };

    Ok(DeclHead {
        name: name.to_string(),
        extends: list_after(extends_at, "extends"),
        implements: list_after(implements_at, "implements"),
    })
}

/// Collect the members of a `{ ... }` body. The body may open on the
/// header line or on the following line and may close on any later line.
fn collect_braced_body(groups: &[StatementGroup], keyword: &str) -> Result<(Vec<MemberChunk>, usize)> {
    let header_line = groups[0].start_line;
    let mut depth = 0i32;
    let mut opened = false;
    let mut pending: Option<MemberChunk> = None;
    let mut chunks = Vec::new();

    for (group_idx, group) in groups.iter().enumerate() {
        for line in &group.lines {
            let mut text = line.code.as_str();

            if !opened {
                match find_unquoted(text, '{') {
                    Some(open) => {
                        opened = true;
                        depth = 1;
                        text = &text[open + 1..];
                    }
                    None => continue,
                }
            }

            depth += brace_balance(text);
            let closed = depth <= 0;
            if closed {
                if let Some(close) = rfind_unquoted(text, '}') {
                    text = &text[..close];
                }
            }

            push_member_text(&mut pending, &mut chunks, line.line_number, text);

            if closed {
                if let Some(chunk) = pending.take() {
                    split_chunk(chunk, &mut chunks);
                }
                return Ok((chunks, group_idx + 1));
            }
        }
    }

    Err(TranspileError::syntax(
        header_line,
        ErrorCode::BR043,
        format!("`{}` body opened with `{{` is never closed", keyword),
    ))
}

/// Members of an indented body: every following group indented deeper
/// than the header
fn collect_indented_body(groups: &[StatementGroup]) -> (Vec<MemberChunk>, usize) {
    let header_indent = groups[0].indent();
    let mut pending: Option<MemberChunk> = None;
    let mut chunks = Vec::new();
    let mut consumed = 1;

    for group in &groups[1..] {
        if group.indent() <= header_indent {
            break;
        }
        for line in &group.lines {
            push_member_text(&mut pending, &mut chunks, line.line_number, &line.code);
        }
        consumed += 1;
    }
    if let Some(chunk) = pending.take() {
        split_chunk(chunk, &mut chunks);
    }

    (chunks, consumed)
}

/// Accumulate body text; a member whose brackets are still open keeps
/// absorbing the following lines
fn push_member_text(pending: &mut Option<MemberChunk>, chunks: &mut Vec<MemberChunk>, line: usize, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    let chunk = match pending.take() {
        Some(mut open) => {
            open.text.push(' ');
            open.text.push_str(text);
            open
        }
        None => MemberChunk { line, text: text.to_string() },
    };

    if brackets_balanced(&chunk.text) {
        split_chunk(chunk, chunks);
    } else {
        *pending = Some(chunk);
    }
}

fn split_chunk(chunk: MemberChunk, chunks: &mut Vec<MemberChunk>) {
    for part in split_top_level(&chunk.text, ',') {
        for member in split_top_level(&part, ';') {
            chunks.push(MemberChunk { line: chunk.line, text: member });
        }
    }
}

fn parse_class_member(chunk: &MemberChunk) -> Result<ClassMember> {
    let bad = || {
        TranspileError::syntax(
            chunk.line,
            ErrorCode::BR040,
            format!("malformed class member `{}`", chunk.text),
        )
    };

    let (decl, value) = match find_assignment_op(&chunk.text) {
        Some((pos, "=")) => (
            chunk.text[..pos].trim(),
            Some(chunk.text[pos + 1..].trim().to_string()),
        ),
        Some(_) => return Err(bad()),
        None => (chunk.text.trim(), None),
    };

    let (name, type_name) = match decl.split_once(':') {
        Some((name, ty)) => (name.trim(), Some(ty.trim().to_string())),
        None => (decl, None),
    };

    if !is_valid_identifier(name)
        || type_name.as_deref().map_or(false, str::is_empty)
        || value.as_deref().map_or(false, str::is_empty)
    {
        return Err(bad());
    }

    Ok(ClassMember {
        name: name.to_string(),
        type_name,
        value,
        line: chunk.line,
        source: chunk.text.clone(),
    })
}

fn parse_enum_variant(chunk: &MemberChunk) -> Result<EnumVariant> {
    let (name, value) = match find_assignment_op(&chunk.text) {
        Some((pos, "=")) => (
            chunk.text[..pos].trim(),
            Some(chunk.text[pos + 1..].trim().to_string()),
        ),
        _ => (chunk.text.trim(), None),
    };

    if !is_valid_identifier(name) || value.as_deref().map_or(false, str::is_empty) {
        return Err(TranspileError::syntax(
            chunk.line,
            ErrorCode::BR041,
            format!("malformed enum member `{}`", chunk.text),
        ));
    }

    Ok(EnumVariant {
        name: name.to_string(),
        value,
        line: chunk.line,
    })
}

fn parse_interface_member(chunk: &MemberChunk) -> Result<InterfaceMember> {
    let text = chunk.text.trim();
    let bad = || {
        TranspileError::syntax(
            chunk.line,
            ErrorCode::BR042,
            format!("malformed interface member `{}`", text),
        )
    };

    if let Some(caps) = INTERFACE_METHOD.captures(text) {
        let params = split_top_level(&caps[2], ',')
            .iter()
            .map(|p| match p.split_once(':') {
                Some((name, ty)) => Param {
                    name: name.trim().to_string(),
                    type_name: Some(ty.trim().to_string()),
                },
                None => Param { name: p.trim().to_string(), type_name: None },
            })
            .collect::<Vec<_>>();
        if params.iter().any(|p| !is_valid_identifier(&p.name)) {
            return Err(bad());
        }
        return Ok(InterfaceMember::Method {
            name: caps[1].to_string(),
            params,
            return_type: caps.get(3).map(|m| m.as_str().trim().to_string()),
            line: chunk.line,
        });
    }

    match text.split_once(':') {
        Some((name, ty)) if is_valid_identifier(name.trim()) && !ty.trim().is_empty() => {
            Ok(InterfaceMember::Property {
                name: name.trim().to_string(),
                type_name: ty.trim().to_string(),
                line: chunk.line,
            })
        }
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::StatementGrouper;

    fn parse(text: &str) -> Result<ParsedProgram> {
        parse_program(&StatementGrouper::new().group_statements(text), true)
    }

    fn kinds(nodes: &[Node]) -> Vec<&'static str> {
        nodes.iter().map(|n| n.kind().name()).collect()
    }

    #[test]
    fn test_classify_control_flow() {
        let program = parse("if a = 1 then\n  x = 1\nelse if a = 2\n  x = 2\nELSE\n  x = 3").expect("parses");
        assert_eq!(kinds(&program.nodes), vec!["if", "elseif", "else"]);
        assert_eq!(
            program.nodes[0].kind(),
            &StatementKind::If { condition: "a = 1".into() }
        );
        assert_eq!(program.nodes[1].kind(), &StatementKind::ElseIf { condition: "a = 2".into() });
        assert_eq!(program.nodes[2].children.len(), 1);
    }

    #[test]
    fn test_keyword_prefix_is_not_keyword() {
        let program = parse("format = 1\ndefault = 2\nifValue = 3").expect("parses");
        assert_eq!(kinds(&program.nodes), vec!["assignment", "assignment", "assignment"]);
    }

    #[test]
    fn test_for_forms() {
        let program = parse("for each o in orders\n  x = o\nfor i = 1 to 10 step 2\n  y = i").expect("parses");
        match program.nodes[0].kind() {
            StatementKind::For { variable, iterable } => {
                assert_eq!(variable, "o");
                assert_eq!(iterable, &ForIterable::Collection { expr: "orders".into() });
            }
            other => panic!("unexpected {:?}", other),
        }
        match program.nodes[1].kind() {
            StatementKind::For { iterable: ForIterable::Range { start, end, step }, .. } => {
                assert_eq!(start, "1");
                assert_eq!(end, "10");
                assert_eq!(step.as_deref(), Some("2"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_for() {
        let err = parse("x = 1\nfor items").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR021);
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_sql_assignment_spans_lines() {
        let program = parse("rows = SELECT name FROM customers WHERE age >\n  18").expect("parses");
        assert_eq!(program.nodes.len(), 1);
        assert_eq!(program.nodes[0].statement.line_count, 2);
        assert!(matches!(
            program.nodes[0].kind(),
            StatementKind::SqlAssignment { query, .. } if query == "SELECT name FROM customers WHERE age > 18"
        ));
    }

    #[test]
    fn test_unrecognized_statement() {
        let err = parse("x = 1\nfrobnicate the widget").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR001);
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse("x = 1\n  y = 2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR002);
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_indented_comment_is_allowed() {
        let program = parse("x = 1\n    // explain\ny = 2").expect("parses");
        assert_eq!(kinds(&program.nodes), vec!["assignment", "comment", "assignment"]);
    }

    #[test]
    fn test_unbalanced_brackets() {
        let err = parse("x = (1 + 2))").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR004);
    }

    #[test]
    fn test_incomplete_group_rejected_or_warned() {
        let groups = StatementGrouper::new().group_statements("if total > 100\ndiscount = 10");
        let err = parse_program(&groups, true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR003);
        assert_eq!(err.line(), 1);

        let program = parse_program(&groups, false).expect("parses");
        assert_eq!(program.warnings.len(), 1);
        assert_eq!(program.total_lines(), 2);
    }

    #[test]
    fn test_braced_class() {
        let text = "class Customer extends Person implements Named {\n  name: string\n  age: number = 0\n  tags = [\"a\",\n    \"b\"]\n}\nx = 1";
        let program = parse(text).expect("parses");
        assert_eq!(kinds(&program.nodes), vec!["class", "assignment"]);
        let class = match program.nodes[0].kind() {
            StatementKind::ClassDecl(c) => c,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(class.name, "Customer");
        assert_eq!(class.extends, vec!["Person"]);
        assert_eq!(class.implements, vec!["Named"]);
        assert_eq!(class.members.len(), 3);
        assert_eq!(class.members[0].type_name.as_deref(), Some("string"));
        assert_eq!(class.members[1].value.as_deref(), Some("0"));
        assert_eq!(class.members[2].line, 4);
        assert_eq!(program.nodes[0].statement.line_count, 6);
        assert_eq!(program.total_lines(), 7);
    }

    #[test]
    fn test_indented_class() {
        let program = parse("class Order\n  total: number\n  status = \"new\"\ny = 2").expect("parses");
        match program.nodes[0].kind() {
            StatementKind::ClassDecl(c) => assert_eq!(c.members.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(program.nodes[0].statement.span, Span::new(1, 3));
    }

    #[test]
    fn test_enum_forms() {
        let one_line = parse("enum Color { RED, GREEN, BLUE }").expect("parses");
        match one_line.nodes[0].kind() {
            StatementKind::EnumDecl(e) => {
                let names: Vec<&str> = e.variants.iter().map(|v| v.name.as_str()).collect();
                assert_eq!(names, vec!["RED", "GREEN", "BLUE"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let multi = parse("enum Level {\n  LOW = 1\n  HIGH = 2\n}").expect("parses");
        match multi.nodes[0].kind() {
            StatementKind::EnumDecl(e) => {
                assert_eq!(e.variants[1].value.as_deref(), Some("2"));
                assert_eq!(e.variants[1].line, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_interface_members() {
        let program =
            parse("interface Priced {\n  price: number\n  discount(rate: number, code): number\n}").expect("parses");
        match program.nodes[0].kind() {
            StatementKind::InterfaceDecl(i) => {
                assert_eq!(i.members.len(), 2);
                assert!(matches!(&i.members[1], InterfaceMember::Method { params, .. } if params.len() == 2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_body() {
        let err = parse("class Broken {\n  a = 1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR043);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_malformed_members() {
        assert_eq!(parse("class A {\n  1bad = 2\n}").unwrap_err().code(), ErrorCode::BR040);
        assert_eq!(parse("enum E { A B }").unwrap_err().code(), ErrorCode::BR041);
        assert_eq!(parse("interface I {\n  what\n}").unwrap_err().code(), ErrorCode::BR042);
    }

    #[test]
    fn test_nested_tree() {
        let text = "for o in orders\n  if o.total > 10\n    big = big + 1\n  else\n    small = small + 1\ndone = true";
        let program = parse(text).expect("parses");
        assert_eq!(kinds(&program.nodes), vec!["for", "assignment"]);
        assert_eq!(kinds(&program.nodes[0].children), vec!["if", "else"]);
        assert_eq!(program.total_lines(), 6);
    }

    #[test]
    fn test_statement_ending_on_operator() {
        let err = parse("x = 1\ny = a +\n\nz = 2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR003);
        assert_eq!(err.line(), 2);

        let groups = StatementGrouper::new().group_statements("ok = ready and");
        let err = parse_program(&groups, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR003);
        assert_eq!(err.line(), 1);
        assert!(err.to_string().contains("logical-operator"), "{}", err);
    }
}
