//! Control Flow Translation
//!
//! Python headers for business-rule control flow:
//!
//! ```text
//! if a = 1 then            ->  if a == 1:
//! elseif a = 2             ->  elif a == 2:
//! while n < 10 do          ->  while n < 10:
//! for each o in orders     ->  for o in orders:
//! for i = 1 to 10 step 2   ->  for i in range(1, 11, 2):
//! switch status            ->  match status:
//! case "A", "B"            ->  case "A" | "B":
//! case LIMIT               ->  case _ if status == LIMIT:
//! default                  ->  case _:
//! ```

use crate::ast::ForIterable;
use crate::helpers::{is_number_literal, is_string_literal, is_valid_identifier};
use crate::translate::condition_translate::{translate_condition, translate_expression};

pub const ELSE_HEADER: &str = "else:";
pub const DEFAULT_CASE_HEADER: &str = "case _:";

pub fn if_header(condition: &str) -> String {
    format!("if {}:", translate_condition(condition))
}

pub fn elif_header(condition: &str) -> String {
    format!("elif {}:", translate_condition(condition))
}

pub fn while_header(condition: &str) -> String {
    format!("while {}:", translate_condition(condition))
}

pub fn for_header(variable: &str, iterable: &ForIterable) -> String {
    match iterable {
        ForIterable::Collection { expr } => {
            format!("for {} in {}:", variable, translate_expression(expr))
        }
        ForIterable::Range { start, end, step } => {
            let start = translate_expression(start);
            let step = step.as_deref().map(translate_expression);
            let descending = step.as_deref().map_or(false, |s| s.trim_start().starts_with('-'));
            let end = inclusive_end(&translate_expression(end), descending);
            match step {
                Some(step) => format!("for {} in range({}, {}, {}):", variable, start, end, step),
                None => format!("for {} in range({}, {}):", variable, start, end),
            }
        }
    }
}

/// `range` excludes its end; business-rule ranges include it
fn inclusive_end(end: &str, descending: bool) -> String {
    let delta: i64 = if descending { -1 } else { 1 };
    match end.parse::<i64>().ok().and_then(|n| n.checked_add(delta)) {
        Some(n) => n.to_string(),
        None if descending => format!("{} - 1", end),
        None => format!("{} + 1", end),
    }
}

pub fn match_header(subject: &str) -> String {
    format!("match {}:", translate_expression(subject))
}

/// Can `value` be written as a Python `match` value pattern?
/// Bare names would be capture patterns, so they are excluded.
fn is_value_pattern(value: &str) -> bool {
    if is_string_literal(value) || is_number_literal(value) {
        return true;
    }
    if matches!(value, "True" | "False" | "None") {
        return true;
    }
    // Dotted names (`Status.ACTIVE`) are value patterns.
    value.contains('.') && value.split('.').all(is_valid_identifier)
}

pub fn case_header(values: &[String], subject: &str) -> String {
    let values: Vec<String> = values.iter().map(|v| translate_expression(v)).collect();

    if values.iter().all(|v| is_value_pattern(v)) {
        return format!("case {}:", values.join(" | "));
    }

    let subject = translate_expression(subject);
    if values.len() == 1 {
        format!("case _ if {} == {}:", subject, values[0])
    } else {
        format!("case _ if {} in ({}):", subject, values.join(", "))
    }
}

pub fn return_line(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("return {}", translate_expression(value)),
        None => "return".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers() {
        assert_eq!(if_header("a = 1 AND b <> 2"), "if a == 1 and b != 2:");
        assert_eq!(elif_header("x >= 3"), "elif x >= 3:");
        assert_eq!(while_header("!done"), "while not done:");
    }

    #[test]
    fn test_for_headers() {
        let each = ForIterable::Collection { expr: "customer.orders".into() };
        assert_eq!(for_header("o", &each), "for o in customer.orders:");

        let counted = ForIterable::Range { start: "1".into(), end: "10".into(), step: None };
        assert_eq!(for_header("i", &counted), "for i in range(1, 11):");

        let stepped = ForIterable::Range { start: "0".into(), end: "n".into(), step: Some("2".into()) };
        assert_eq!(for_header("i", &stepped), "for i in range(0, n + 1, 2):");

        let down = ForIterable::Range { start: "10".into(), end: "1".into(), step: Some("-1".into()) };
        assert_eq!(for_header("i", &down), "for i in range(10, 0, -1):");
    }

    #[test]
    fn test_range_end_at_integer_limits() {
        let max = ForIterable::Range { start: "1".into(), end: i64::MAX.to_string(), step: None };
        assert_eq!(
            for_header("i", &max),
            "for i in range(1, 9223372036854775807 + 1):"
        );

        let min = ForIterable::Range { start: "0".into(), end: i64::MIN.to_string(), step: Some("-1".into()) };
        assert_eq!(
            for_header("i", &min),
            "for i in range(0, -9223372036854775808 - 1, -1):"
        );
    }

    #[test]
    fn test_case_headers() {
        let literals = vec!["\"A\"".to_string(), "2".to_string(), "Status.OPEN".to_string()];
        assert_eq!(case_header(&literals, "s"), "case \"A\" | 2 | Status.OPEN:");

        let names = vec!["LIMIT".to_string()];
        assert_eq!(case_header(&names, "s"), "case _ if s == LIMIT:");

        let mixed = vec!["1".to_string(), "other".to_string()];
        assert_eq!(case_header(&mixed, "s"), "case _ if s in (1, other):");

        assert_eq!(case_header(&["true".to_string()], "flag"), "case True:");

        let float_names = vec!["inf".to_string(), "nan".to_string()];
        assert_eq!(case_header(&float_names, "x"), "case _ if x in (inf, nan):");
        assert_eq!(case_header(&["-1.5".to_string()], "x"), "case -1.5:");
    }

    #[test]
    fn test_return_line() {
        assert_eq!(return_line(None), "return");
        assert_eq!(return_line(Some("total && ok")), "return total and ok");
    }
}
