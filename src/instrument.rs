//! Step Instrumentation
//!
//! Instrumented output lets a debugger pause between statements. Every
//! simple statement is followed (and every jump preceded) by
//!
//! ```text
//! __STEP_CONTROL__("STMT_<business line>", <python line>, <business line>, "<source>")
//! ```
//!
//! and the program body runs inside a `try:` that reports failures as an
//! `__EXECUTION_ERROR__` marker followed by a JSON record. A no-op
//! `__STEP_CONTROL__` is defined when the host has not injected one, so
//! instrumented code also runs standalone.

use crate::helpers::py_string_literal;

pub const STEP_FUNCTION: &str = "__STEP_CONTROL__";
pub const ERROR_MARKER: &str = "__EXECUTION_ERROR__";

/// Extra nesting of the program body inside the `try:` wrapper
pub const BODY_DEPTH: usize = 1;

/// Step-control call for one statement
pub fn step_call(business_line: usize, python_line: usize, source: &str) -> String {
    format!(
        "{}(\"STMT_{}\", {}, {}, {})",
        STEP_FUNCTION,
        business_line,
        python_line,
        business_line,
        py_string_literal(source)
    )
}

/// Lines before the program body; the last one opens the `try:`
pub fn prelude() -> Vec<String> {
    vec![
        "import json".to_string(),
        "import traceback".to_string(),
        String::new(),
        "try:".to_string(),
        format!("    {}", STEP_FUNCTION),
        "except NameError:".to_string(),
        format!(
            "    def {}(step_id, python_line, business_line, description=\"\"):",
            STEP_FUNCTION
        ),
        "        return True".to_string(),
        String::new(),
        "try:".to_string(),
    ]
}

/// Lines after the program body
pub fn epilogue() -> Vec<String> {
    vec![
        "except Exception as e:".to_string(),
        format!("    print(\"{}\")", ERROR_MARKER),
        "    print(json.dumps({\"error\": str(e), \"traceback\": traceback.format_exc()}))".to_string(),
        String::new(),
        format!("{}(\"COMPLETE\", 0, 0, \"Execution completed\")", STEP_FUNCTION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_call() {
        assert_eq!(
            step_call(3, 12, "name = \"ell\""),
            "__STEP_CONTROL__(\"STMT_3\", 12, 3, \"name = \\\"ell\\\"\")"
        );
    }

    #[test]
    fn test_wrapper_shape() {
        let prelude = prelude();
        assert_eq!(prelude.last().map(String::as_str), Some("try:"));
        assert!(prelude.iter().any(|l| l == "import traceback"));

        let epilogue = epilogue();
        assert_eq!(epilogue[0], "except Exception as e:");
        assert_eq!(
            epilogue.last().map(String::as_str),
            Some("__STEP_CONTROL__(\"COMPLETE\", 0, 0, \"Execution completed\")")
        );
    }
}
