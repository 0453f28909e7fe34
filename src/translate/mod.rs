//! Translation Module
//!
//! Per-construct emitters that turn classified business-rule statements
//! into Python source lines. Each function returns line text without
//! indentation; the generator owns indentation.

// Conditions and expressions
pub mod condition_translate;

// Statement translations
pub mod assignment_translate;
pub mod control_flow_translate;
pub mod declaration_translate;

// Re-exports for convenience
pub use assignment_translate::{assignment_line, comment_line, expression_line, sql_assignment_line};
pub use condition_translate::{translate_condition, translate_expression};
pub use control_flow_translate::{
    case_header, elif_header, for_header, if_header, match_header, return_line, while_header,
    DEFAULT_CASE_HEADER, ELSE_HEADER,
};
pub use declaration_translate::{
    class_header, class_member_line, enum_header, enum_variant_line, interface_header,
    interface_member_line, python_type, ENUM_IMPORT, PROTOCOL_IMPORT,
};
