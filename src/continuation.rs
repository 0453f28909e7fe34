//! Line Continuation Detection
//!
//! Decides, for every physical line of a business rule, whether the
//! statement it belongs to continues on the next line. The decision comes
//! from a prioritized rule set: rules are tested from the highest priority
//! down and the first match wins. When nothing matches the line is a
//! complete statement.
//!
//! ```text
//! hello(customerName,      <- comma-continuation
//!       "Dear")            <- complete-statement
//! if total > 100           <- complete (next line is more indented)
//!     discount = 10
//! ```
//!
//! A comment-only line takes the decision of the code line above it, so a
//! comment inside a continued statement does not end it.
//!
//! Detection is a heuristic and has no error outcome. A rule that fails is
//! logged and treated as non-matching.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::helpers::{code_part, ends_with_word, leading_whitespace_width, paren_balance};

/// Reason reported when no rule matched
pub const COMPLETE_STATEMENT: &str = "complete-statement";
/// Reason reported for blank lines
pub const EMPTY_LINE: &str = "empty-line";
/// Reason reported for the final line of the input
pub const END_OF_INPUT: &str = "end-of-input";
/// Reason reported for a comment line outside a continued statement
pub const COMMENT_LINE: &str = "comment-line";

pub const COMMA_CONTINUATION: &str = "comma-continuation";
pub const OPEN_PAREN_CONTINUATION: &str = "open-paren-continuation";
pub const ASSIGNMENT_CONTINUATION: &str = "assignment-continuation";
pub const LOGICAL_OPERATOR_CONTINUATION: &str = "logical-operator-continuation";
pub const ARITHMETIC_OPERATOR_CONTINUATION: &str = "arithmetic-operator-continuation";
pub const COMPARISON_OPERATOR_CONTINUATION: &str = "comparison-operator-continuation";
pub const INCOMPLETE_FUNCTION_CALL: &str = "incomplete-function-call";
pub const INCOMPLETE_IF_STATEMENT: &str = "incomplete-if-statement";
pub const STRING_CONCATENATION: &str = "string-concatenation";

//=============================================================================
// LINE INFO
//=============================================================================

/// One physical source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInfo {
    /// Raw line content
    pub content: String,
    /// 1-based line number
    pub line_number: usize,
    /// Content with surrounding whitespace removed
    pub trimmed: String,
    /// Trimmed content with comments removed; empty for comment lines
    pub code: String,
    /// Leading whitespace width
    pub indent_level: usize,
    pub is_empty: bool,
}

impl LineInfo {
    pub fn new(content: &str, line_number: usize) -> Self {
        let trimmed = content.trim().to_string();
        LineInfo {
            content: content.to_string(),
            line_number,
            code: code_part(content),
            indent_level: leading_whitespace_width(content),
            is_empty: trimmed.is_empty(),
            trimmed,
        }
    }
}

/// Split source text into [`LineInfo`]s
pub fn parse_lines(text: &str) -> Vec<LineInfo> {
    text.lines()
        .enumerate()
        .map(|(i, line)| LineInfo::new(line, i + 1))
        .collect()
}

//=============================================================================
// RULES
//=============================================================================

/// The view a rule gets of the line under test and its neighbours
#[derive(Debug, Clone, Copy)]
pub struct ContinuationContext<'a> {
    pub previous: Option<&'a LineInfo>,
    pub current: &'a LineInfo,
    pub next: Option<&'a LineInfo>,
}

impl<'a> ContinuationContext<'a> {
    /// Code of the current line (comments stripped)
    pub fn code(&self) -> &'a str {
        &self.current.code
    }

    /// Is there a non-empty next line?
    pub fn has_next_content(&self) -> bool {
        self.next.map_or(false, |n| !n.is_empty)
    }

    /// Is the next line indented deeper than the current one?
    pub fn next_is_more_indented(&self) -> bool {
        self.next
            .map_or(false, |n| !n.is_empty && n.indent_level > self.current.indent_level)
    }
}

/// A rule failure. Reported through the log, never to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError(pub String);

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type RuleTest = dyn Fn(&ContinuationContext<'_>) -> Result<bool, RuleError> + Send + Sync;

/// A named, prioritized continuation test
#[derive(Clone)]
pub struct ContinuationRule {
    pub name: String,
    pub description: String,
    pub priority: i32,
    /// Advisory confidence reported when this rule decides
    pub confidence: f32,
    test: Arc<RuleTest>,
}

impl fmt::Debug for ContinuationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

impl ContinuationRule {
    /// Build a rule from an infallible test
    pub fn new<F>(name: &str, description: &str, priority: i32, test: F) -> Self
    where
        F: Fn(&ContinuationContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::fallible(name, description, priority, move |ctx| Ok(test(ctx)))
    }

    /// Build a rule whose test can fail
    pub fn fallible<F>(name: &str, description: &str, priority: i32, test: F) -> Self
    where
        F: Fn(&ContinuationContext<'_>) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        ContinuationRule {
            name: name.to_string(),
            description: description.to_string(),
            priority,
            confidence: 0.9,
            test: Arc::new(test),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn test(&self, ctx: &ContinuationContext<'_>) -> Result<bool, RuleError> {
        (self.test)(ctx)
    }
}

/// Outcome of continuation detection for one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationDetectionResult {
    pub should_continue: bool,
    /// Deciding rule name, or a fixed token
    pub reason: String,
    /// Advisory, in 0..=1
    pub confidence: f32,
}

impl ContinuationDetectionResult {
    fn fixed(should_continue: bool, reason: &str, confidence: f32) -> Self {
        ContinuationDetectionResult {
            should_continue,
            reason: reason.to_string(),
            confidence,
        }
    }
}

fn ends_with_any_word(code: &str, words: &[&str]) -> bool {
    words.iter().any(|w| ends_with_word(code, w))
}

fn ends_with_logical(code: &str) -> bool {
    code.ends_with("&&")
        || code.ends_with("||")
        || ends_with_any_word(&code.to_lowercase(), &["and", "or", "not"])
}

fn ends_with_arithmetic(code: &str) -> bool {
    ['+', '-', '*', '/', '%'].iter().any(|op| code.ends_with(*op))
        && !code.ends_with("++")
        && !code.ends_with("--")
}

fn ends_with_comparison(code: &str) -> bool {
    ["==", "!=", ">=", "<=", ">", "<"].iter().any(|op| code.ends_with(*op))
        || ends_with_any_word(code, &["contains", "in", "is"])
}

/// Rule name of the operator a statement ends on, if it ends on one.
/// Such a statement is still waiting for its right-hand side.
pub fn dangling_operator(code: &str) -> Option<&'static str> {
    let code = code.trim_end();
    if code.ends_with(',') {
        Some(COMMA_CONTINUATION)
    } else if code.ends_with('=') {
        Some(ASSIGNMENT_CONTINUATION)
    } else if ends_with_logical(code) {
        Some(LOGICAL_OPERATOR_CONTINUATION)
    } else if ends_with_arithmetic(code) {
        Some(ARITHMETIC_OPERATOR_CONTINUATION)
    } else if ends_with_comparison(code) {
        Some(COMPARISON_OPERATOR_CONTINUATION)
    } else {
        None
    }
}

/// Does the line look like a call whose argument list is still open?
fn is_open_function_call(code: &str) -> bool {
    if paren_balance(code) <= 0 {
        return false;
    }
    // name( or obj.name( somewhere before the unmatched paren
    code.char_indices().any(|(i, c)| {
        c == '('
            && code[..i]
                .trim_end()
                .chars()
                .last()
                .map_or(false, |p| p.is_alphanumeric() || p == '_')
    })
}

/// The built-in rule set, in declaration order
pub fn default_rules() -> Vec<ContinuationRule> {
    vec![
        ContinuationRule::new(
            COMMA_CONTINUATION,
            "Line ends with a comma",
            100,
            |ctx| ctx.code().ends_with(','),
        )
        .with_confidence(0.95),
        ContinuationRule::new(
            OPEN_PAREN_CONTINUATION,
            "More `(` than `)` and the statement can still close on the next line",
            95,
            |ctx| paren_balance(ctx.code()) > 0 && ctx.has_next_content(),
        )
        .with_confidence(0.95),
        ContinuationRule::new(
            ASSIGNMENT_CONTINUATION,
            "Line ends with `=`",
            90,
            |ctx| ctx.code().ends_with('='),
        ),
        ContinuationRule::new(
            LOGICAL_OPERATOR_CONTINUATION,
            "Line ends with a logical operator",
            85,
            |ctx| ends_with_logical(ctx.code()),
        ),
        ContinuationRule::new(
            ARITHMETIC_OPERATOR_CONTINUATION,
            "Line ends with an arithmetic operator",
            80,
            |ctx| ends_with_arithmetic(ctx.code()),
        )
        .with_confidence(0.85),
        ContinuationRule::new(
            COMPARISON_OPERATOR_CONTINUATION,
            "Line ends with a comparison operator",
            75,
            |ctx| ends_with_comparison(ctx.code()),
        )
        .with_confidence(0.85),
        ContinuationRule::new(
            INCOMPLETE_FUNCTION_CALL,
            "Function call whose argument list never closes",
            70,
            |ctx| is_open_function_call(ctx.code()),
        )
        .with_confidence(0.7),
        ContinuationRule::new(
            INCOMPLETE_IF_STATEMENT,
            "`if` with no `then`, `=` or `()` and no indented body",
            65,
            |ctx| {
                let code = ctx.code();
                let lower = code.to_lowercase();
                (lower.starts_with("if ") || lower == "if")
                    && !ends_with_word(&lower, "then")
                    && !code.contains('=')
                    && !code.contains("()")
                    && ctx.has_next_content()
                    && !ctx.next_is_more_indented()
            },
        )
        .with_confidence(0.6),
        ContinuationRule::new(
            STRING_CONCATENATION,
            "String literal followed by a trailing `+`",
            60,
            |ctx| {
                let code = ctx.code();
                code.strip_suffix('+')
                    .map(|rest| {
                        let rest = rest.trim_end();
                        rest.ends_with('"') || rest.ends_with('\'')
                    })
                    .unwrap_or(false)
            },
        )
        .with_confidence(0.9),
    ]
}

//=============================================================================
// DETECTOR
//=============================================================================

/// Index of the first line after `index` that is blank or has code.
/// Comment lines in between are skipped.
fn next_code_line(lines: &[LineInfo], index: usize) -> Option<usize> {
    (index + 1..lines.len()).find(|&i| lines[i].is_empty || !lines[i].code.is_empty())
}

/// Index of the code line a run of comment lines follows, if no blank
/// line separates them
fn previous_code_line(lines: &[LineInfo], index: usize) -> Option<usize> {
    for i in (0..index).rev() {
        if lines[i].is_empty {
            return None;
        }
        if !lines[i].code.is_empty() {
            return Some(i);
        }
    }
    None
}

/// Line continuation detector over a mutable rule set
#[derive(Debug, Clone)]
pub struct LineContinuationDetector {
    rules: Vec<ContinuationRule>,
}

impl Default for LineContinuationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LineContinuationDetector {
    /// Detector with the built-in rules
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    pub fn with_rules(rules: Vec<ContinuationRule>) -> Self {
        let mut detector = LineContinuationDetector { rules };
        detector.sort_rules();
        detector
    }

    // Stable: equal priorities keep declaration order.
    fn sort_rules(&mut self) {
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn rules(&self) -> &[ContinuationRule] {
        &self.rules
    }

    /// Add a rule; affects future calls only
    pub fn add_rule(&mut self, rule: ContinuationRule) {
        self.rules.push(rule);
        self.sort_rules();
    }

    /// Remove every rule with this name. Returns true when one was removed.
    pub fn remove_rule(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.name != name);
        self.rules.len() != before
    }

    /// Split text into lines
    pub fn parse_lines(&self, text: &str) -> Vec<LineInfo> {
        parse_lines(text)
    }

    /// Decide whether `lines[index]` continues onto the next line
    pub fn should_continue(&self, lines: &[LineInfo], index: usize) -> ContinuationDetectionResult {
        let current = match lines.get(index) {
            Some(line) => line,
            None => return ContinuationDetectionResult::fixed(false, END_OF_INPUT, 1.0),
        };

        if current.is_empty {
            return ContinuationDetectionResult::fixed(false, EMPTY_LINE, 1.0);
        }
        if current.code.is_empty() {
            // A comment line carries the decision of the code line above it
            return match previous_code_line(lines, index) {
                Some(prev) => {
                    let inherited = self.should_continue(lines, prev);
                    if inherited.should_continue {
                        inherited
                    } else {
                        ContinuationDetectionResult::fixed(false, COMMENT_LINE, 1.0)
                    }
                }
                None => ContinuationDetectionResult::fixed(false, COMMENT_LINE, 1.0),
            };
        }
        // Only comment lines left: nothing the statement could continue into
        if next_code_line(lines, index).is_none() {
            return ContinuationDetectionResult::fixed(false, END_OF_INPUT, 1.0);
        }

        let ctx = ContinuationContext {
            previous: index.checked_sub(1).and_then(|i| lines.get(i)),
            current,
            next: lines.get(index + 1),
        };

        for rule in &self.rules {
            match rule.test(&ctx) {
                Ok(true) => {
                    return ContinuationDetectionResult {
                        should_continue: true,
                        reason: rule.name.clone(),
                        confidence: rule.confidence,
                    };
                }
                Ok(false) => {}
                Err(err) => {
                    log::warn!(
                        "continuation rule `{}` failed on line {}: {}",
                        rule.name,
                        current.line_number,
                        err
                    );
                }
            }
        }

        ContinuationDetectionResult::fixed(false, COMPLETE_STATEMENT, 0.8)
    }

    /// Run detection over every line of `text`
    pub fn analyze_text(&self, text: &str) -> Vec<ContinuationDetectionResult> {
        let lines = parse_lines(text);
        self.analyze_lines(&lines)
    }

    pub fn analyze_lines(&self, lines: &[LineInfo]) -> Vec<ContinuationDetectionResult> {
        (0..lines.len()).map(|i| self.should_continue(lines, i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str, index: usize) -> ContinuationDetectionResult {
        let detector = LineContinuationDetector::new();
        let lines = parse_lines(text);
        detector.should_continue(&lines, index)
    }

    #[test]
    fn test_parse_lines() {
        let lines = parse_lines("x = 1\n\n    y = 2 // note");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line_number, 1);
        assert!(lines[1].is_empty);
        assert_eq!(lines[2].indent_level, 4);
        assert_eq!(lines[2].trimmed, "y = 2 // note");
        assert_eq!(lines[2].code, "y = 2");
    }

    #[test]
    fn test_comma_outranks_open_paren() {
        let result = detect("hello(customerName,\n  \"Dear\")", 0);
        assert!(result.should_continue);
        assert_eq!(result.reason, COMMA_CONTINUATION);
    }

    #[test]
    fn test_open_paren() {
        let result = detect("total = sum(a\n  , b)", 0);
        assert!(result.should_continue);
        assert_eq!(result.reason, OPEN_PAREN_CONTINUATION);
    }

    #[test]
    fn test_open_call_before_blank_line_is_incomplete() {
        let result = detect("notify(user\n\nx = 1", 0);
        assert!(result.should_continue);
        assert_eq!(result.reason, INCOMPLETE_FUNCTION_CALL);
    }

    #[test]
    fn test_assignment_and_operators() {
        assert_eq!(detect("x =\n  5", 0).reason, ASSIGNMENT_CONTINUATION);
        assert_eq!(detect("ok = a and\n  b", 0).reason, LOGICAL_OPERATOR_CONTINUATION);
        assert_eq!(detect("ok = a ||\n  b", 0).reason, LOGICAL_OPERATOR_CONTINUATION);
        assert_eq!(detect("t = a +\n  b", 0).reason, ARITHMETIC_OPERATOR_CONTINUATION);
        assert_eq!(detect("ok = a >\n  b", 0).reason, COMPARISON_OPERATOR_CONTINUATION);
        assert_eq!(detect("ok = tags contains\n  \"x\"", 0).reason, COMPARISON_OPERATOR_CONTINUATION);
    }

    #[test]
    fn test_words_need_boundaries() {
        assert!(!detect("x = color\ny = 1", 0).should_continue);
        assert!(!detect("x = main\ny = 1", 0).should_continue);
    }

    #[test]
    fn test_string_concatenation_is_shadowed_by_arithmetic() {
        // Both match; the higher priority arithmetic rule decides.
        let result = detect("msg = \"Hello \" +\n  name", 0);
        assert_eq!(result.reason, ARITHMETIC_OPERATOR_CONTINUATION);

        let mut detector = LineContinuationDetector::new();
        detector.remove_rule(ARITHMETIC_OPERATOR_CONTINUATION);
        let lines = parse_lines("msg = \"Hello \" +\n  name");
        assert_eq!(detector.should_continue(&lines, 0).reason, STRING_CONCATENATION);
    }

    #[test]
    fn test_if_with_indented_body_is_complete() {
        let result = detect("if total > 100\n    discount = 10", 0);
        assert!(!result.should_continue);
        assert_eq!(result.reason, COMPLETE_STATEMENT);
    }

    #[test]
    fn test_if_without_body_is_incomplete() {
        let result = detect("if total > 100\ndiscount = 10", 0);
        assert!(result.should_continue);
        assert_eq!(result.reason, INCOMPLETE_IF_STATEMENT);
    }

    #[test]
    fn test_empty_and_last_lines_never_continue() {
        assert_eq!(detect("x = 1\n\ny = 2", 1).reason, EMPTY_LINE);
        let last = detect("x = 1\ny = a +", 1);
        assert!(!last.should_continue);
        assert_eq!(last.reason, END_OF_INPUT);
    }

    #[test]
    fn test_comment_text_does_not_continue() {
        assert!(!detect("# list a,\nx = 1", 0).should_continue);
        assert!(!detect("x = 1 // then a,\ny = 2", 0).should_continue);
    }

    #[test]
    fn test_comment_lines_inside_a_continuation() {
        let source = "total = a +\n    // tax\n    b\nnext = 1";
        let first = detect(source, 0);
        assert!(first.should_continue);
        assert_eq!(first.reason, ARITHMETIC_OPERATOR_CONTINUATION);
        let comment = detect(source, 1);
        assert!(comment.should_continue);
        assert_eq!(comment.reason, ARITHMETIC_OPERATOR_CONTINUATION);
        assert!(!detect(source, 2).should_continue);
    }

    #[test]
    fn test_comment_line_between_statements() {
        let source = "x = 1\n// note\ny = 2";
        assert!(!detect(source, 0).should_continue);
        assert_eq!(detect(source, 1).reason, COMMENT_LINE);
        assert_eq!(detect("x = a +\n// trailing", 0).reason, END_OF_INPUT);
        assert_eq!(detect("x = a +\n\n// later", 2).reason, COMMENT_LINE);
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(dangling_operator("x = a +"), Some(ARITHMETIC_OPERATOR_CONTINUATION));
        assert_eq!(dangling_operator("ok = a and"), Some(LOGICAL_OPERATOR_CONTINUATION));
        assert_eq!(dangling_operator("ok = a &&  "), Some(LOGICAL_OPERATOR_CONTINUATION));
        assert_eq!(dangling_operator("total ="), Some(ASSIGNMENT_CONTINUATION));
        assert_eq!(dangling_operator("f(a,"), Some(COMMA_CONTINUATION));
        assert_eq!(dangling_operator("if x >"), Some(COMPARISON_OPERATOR_CONTINUATION));
        assert_eq!(dangling_operator("i++"), None);
        assert_eq!(dangling_operator("x = a + b"), None);
        assert_eq!(dangling_operator("brand = sand"), None);
    }

    #[test]
    fn test_failing_rule_is_skipped() {
        let mut detector = LineContinuationDetector::new();
        detector.add_rule(ContinuationRule::fallible("broken", "always fails", 1000, |_| {
            Err(RuleError("boom".to_string()))
        }));
        let lines = parse_lines("x = a,\n  b");
        let result = detector.should_continue(&lines, 0);
        assert!(result.should_continue);
        assert_eq!(result.reason, COMMA_CONTINUATION);
    }

    #[test]
    fn test_custom_rule_priority_and_removal() {
        let mut detector = LineContinuationDetector::new();
        detector.add_rule(ContinuationRule::new("backslash", "Trailing backslash", 110, |ctx| {
            ctx.code().ends_with('\\')
        }));
        let lines = parse_lines("x = 1 \\\n  + 2");
        assert_eq!(detector.should_continue(&lines, 0).reason, "backslash");

        assert!(detector.remove_rule("backslash"));
        assert!(!detector.should_continue(&lines, 0).should_continue);
        assert!(!detector.remove_rule("backslash"));
    }

    #[test]
    fn test_equal_priority_keeps_declaration_order() {
        let detector = LineContinuationDetector::with_rules(vec![
            ContinuationRule::new("first", "", 10, |_| true),
            ContinuationRule::new("second", "", 10, |_| true),
        ]);
        let lines = parse_lines("a\nb");
        assert_eq!(detector.should_continue(&lines, 0).reason, "first");
    }

    #[test]
    fn test_analyze_text() {
        let results = LineContinuationDetector::new().analyze_text("a = [1,\n 2]\n\nb = 3");
        assert_eq!(results.len(), 4);
        assert!(results[0].should_continue);
        assert!(!results[1].should_continue);
        assert_eq!(results[2].reason, EMPTY_LINE);
        assert_eq!(results[3].reason, END_OF_INPUT);
    }
}
