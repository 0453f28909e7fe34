//! rulepy: business-rule to Python transpiler
//!
//! Business rules are written in an indentation-structured rule language
//! (`if any order in orders has order.total > 100`, `switch`, `class`, ...)
//! and translated into executable Python, with a statement-level source
//! map so an editor can step through the Python while showing the rule.
//!
//! ```
//! let result = rulepy::translate("if total > 100 then\n    discount = 10\n");
//! assert!(result.success);
//! assert_eq!(result.generated_code, "if total > 100:\n    discount = 10\n");
//! ```

// Line handling
pub mod continuation;
pub mod grouping;
pub mod helpers;
pub mod indentation;

// Statement model
pub mod ast;
pub mod error_msg;
pub mod parser;

// Types and configuration
pub mod options;
pub mod schema;
pub mod type_registry;

// Generation
pub mod codegen;
pub mod instrument;
pub mod source_map;
pub mod translate;
pub mod transpile_main;

// Re-exports for convenience
pub use codegen::{CodeGenerator, DispatchStep, GeneratedProgram};
pub use continuation::{LineContinuationDetector, LineInfo};
pub use error_msg::{ErrorCode, TranspileError};
pub use grouping::{GroupingStatistics, StatementGroup, StatementGrouper};
pub use options::{OptionsError, TranspileOptions};
pub use source_map::{BusinessRuleSourceMap, SourceMapBuilder, SourceMapConsumer};
pub use translate::condition_translate::translate_condition;
pub use transpile_main::{translate, TranslateResult, Transpiler};
pub use type_registry::TypeRegistry;
