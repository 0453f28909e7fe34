//! Main Transpilation Entry
//!
//! Runs the whole pipeline over one business-rule text:
//!
//! ```text
//! source ─► group ─► parse + tree ─► type registry ─► generate ─► result
//! ```
//!
//! Every stage is rebuilt from the input on each call; nothing is cached
//! between calls. Failures never escape as panics or `Err`: they come back
//! as `success: false` with the errors listed.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::codegen::{CodeGenerator, DispatchStep, GeneratedProgram};
use crate::error_msg::TranspileError;
use crate::grouping::{StatementGroup, StatementGrouper};
use crate::options::TranspileOptions;
use crate::parser::parse_program;
use crate::source_map::BusinessRuleSourceMap;
use crate::type_registry::TypeRegistry;

/// Outcome of a `translate` call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResult {
    pub success: bool,
    /// Empty when `success` is false
    pub generated_code: String,
    pub source_map: BusinessRuleSourceMap,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Top-level dispatch record of the generator
    #[serde(skip_deserializing)]
    pub steps: Vec<DispatchStep>,
}

impl TranslateResult {
    fn failed(errors: Vec<String>, warnings: Vec<String>) -> Self {
        TranslateResult {
            success: false,
            generated_code: String::new(),
            source_map: BusinessRuleSourceMap::empty(),
            errors,
            warnings,
            steps: Vec::new(),
        }
    }
}

/// Translate with the default options
pub fn translate(source: &str) -> TranslateResult {
    Transpiler::default().translate(source)
}

/// A configured transpiler. Holds only its options, so one instance can
/// serve any number of sources.
#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    options: TranspileOptions,
    grouper: StatementGrouper,
}

impl Transpiler {
    pub fn new(options: TranspileOptions) -> Self {
        Transpiler {
            options,
            grouper: StatementGrouper::new(),
        }
    }

    pub fn options(&self) -> &TranspileOptions {
        &self.options
    }

    /// Group the source the same way `translate` does
    pub fn group(&self, source: &str) -> Vec<StatementGroup> {
        self.grouper.group_statements(source)
    }

    pub fn translate(&self, source: &str) -> TranslateResult {
        self.translate_rendered(source, |err| err.to_string())
    }

    /// Like `translate`, but each error carries the offending source line
    pub fn translate_with_diagnostics(&self, source: &str) -> TranslateResult {
        self.translate_rendered(source, |err| err.format_with_source(source))
    }

    fn translate_rendered<F>(&self, source: &str, render: F) -> TranslateResult
    where
        F: Fn(&TranspileError) -> String,
    {
        let mut warnings = Vec::new();
        match self.run(source, &mut warnings) {
            Ok(program) => {
                debug!(
                    "translated {} statements into {} python lines",
                    program.steps.len(),
                    program.source_map.python_line_count
                );
                TranslateResult {
                    success: true,
                    generated_code: program.code,
                    source_map: program.source_map,
                    errors: Vec::new(),
                    warnings,
                    steps: program.steps,
                }
            }
            Err(err) => {
                debug!("translation failed at line {}: {}", err.line(), err);
                TranslateResult::failed(vec![render(&err)], warnings)
            }
        }
    }

    fn run(&self, source: &str, warnings: &mut Vec<String>) -> Result<GeneratedProgram, TranspileError> {
        let groups = self.group(source);
        debug!("grouped {} statements", groups.len());

        let program = parse_program(&groups, self.options.reject_incomplete)?;
        warnings.extend(program.warnings.iter().cloned());

        let registry = TypeRegistry::build(&program.nodes, &self.options.modules, &self.options.global_objects);
        warnings.extend(registry.warnings().iter().cloned());

        CodeGenerator::new(&self.options, &registry).generate(&program, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_success() {
        let result = translate("total = price * qty\nif total > 100 then\n    discount = 10\n");
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(
            result.generated_code,
            "total = price * qty\nif total > 100:\n    discount = 10\n"
        );
        assert!(result.errors.is_empty());
        assert_eq!(result.source_map.statements.len(), 3);
    }

    #[test]
    fn test_translate_failure_has_no_code() {
        let result = translate("x = 1\nfrobnicate the widget\n");
        assert!(!result.success);
        assert!(result.generated_code.is_empty());
        assert!(result.source_map.statements.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("line 2:"), "{}", result.errors[0]);
    }

    #[test]
    fn test_incomplete_is_warning_when_allowed() {
        let source = "if x > 1\ny = 2\n";
        let strict = translate(source);
        assert!(!strict.success);
        assert!(strict.errors[0].contains("BR003"));

        let lenient = Transpiler::new(TranspileOptions::default().with_reject_incomplete(false));
        let result = lenient.translate(source);
        assert!(result.success, "{:?}", result.errors);
        assert!(result.warnings[0].starts_with("line 1: incomplete statement"));
    }

    #[test]
    fn test_registry_warnings_surface() {
        let source = "class A\n    x = 1\nclass A\n    x = 2\n";
        let result = translate(source);
        assert!(result.success, "{:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.contains("property `x` already declared")));
    }

    #[test]
    fn test_diagnostics_show_source() {
        let transpiler = Transpiler::default();
        let result = transpiler.translate_with_diagnostics("if any o in orders\n    x = 1\n");
        assert!(!result.success);
        assert!(result.errors[0].contains("BR020"));
        assert!(result.errors[0].contains("  1 | if any o in orders"));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = translate("x = 1\n");
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"generatedCode\""));
        assert!(json.contains("\"sourceMap\""));
        assert!(json.contains("\"consumedLines\""));
    }
}
