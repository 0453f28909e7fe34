//! Assignment and Simple Statement Translation
//!
//! - `total = price * qty` keeps its shape; the value is translated
//! - `rows = SELECT * FROM orders` hands the query text to the configured
//!   SQL function: `rows = execute_query("SELECT * FROM orders")`
//! - call statements and comments pass through with translated operators

use crate::helpers::py_string_literal;
use crate::translate::condition_translate::translate_expression;

pub fn assignment_line(target: &str, op: &str, value: &str) -> String {
    format!("{} {} {}", target, op, translate_expression(value))
}

pub fn sql_assignment_line(target: &str, query: &str, sql_function: &str) -> String {
    format!("{} = {}({})", target, sql_function, py_string_literal(query.trim()))
}

pub fn expression_line(text: &str) -> String {
    translate_expression(text)
}

pub fn comment_line(text: &str) -> String {
    if text.is_empty() {
        "#".to_string()
    } else {
        format!("# {}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment() {
        assert_eq!(assignment_line("ok", "=", "a && !b"), "ok = a and not b");
        assert_eq!(assignment_line("total", "+=", "5"), "total += 5");
        assert_eq!(assignment_line("c", "=", "new Customer()"), "c = Customer()");
    }

    #[test]
    fn test_sql_assignment() {
        assert_eq!(
            sql_assignment_line("rows", "SELECT * FROM t WHERE name = \"x\"", "execute_query"),
            "rows = execute_query(\"SELECT * FROM t WHERE name = \\\"x\\\"\")"
        );
        assert_eq!(sql_assignment_line("r", "select 1", "db.run"), "r = db.run(\"select 1\")");
    }

    #[test]
    fn test_expression_and_comment() {
        assert_eq!(expression_line("notify(user, true)"), "notify(user, True)");
        assert_eq!(comment_line("check limits"), "# check limits");
        assert_eq!(comment_line(""), "#");
    }
}
