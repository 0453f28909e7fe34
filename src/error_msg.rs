//! Error Message System for business-rule translation
//!
//! Every fatal problem found while translating a business rule is reported
//! as a [`TranspileError`] carrying the 1-based business-rule line and a
//! stable error code. Nothing here is ever thrown across the public
//! `translate()` boundary: the transpiler converts these into plain strings
//! in `TranslateResult::errors`.
//!
//! ## Error Code Format
//!
//! `BRxxx` where `xxx` is a 3-digit code grouped by category:
//! - 001-019: Structure errors (statement shape, indentation, brackets)
//! - 020-039: Control flow errors (if/if any/for/while/switch)
//! - 040-059: Declaration errors (class/enum/interface)
//! - 060-079: Expression errors

use std::fmt;

use thiserror::Error;

//=============================================================================
// ERROR CATEGORIES
//=============================================================================

/// Error category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Statement shape errors (BR001-019)
    Structure,
    /// Control flow errors (BR020-039)
    ControlFlow,
    /// Declaration errors (BR040-059)
    Declaration,
    /// Expression errors (BR060-079)
    Expression,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Structure => write!(f, "structure"),
            ErrorCategory::ControlFlow => write!(f, "control-flow"),
            ErrorCategory::Declaration => write!(f, "declaration"),
            ErrorCategory::Expression => write!(f, "expression"),
        }
    }
}

//=============================================================================
// ERROR CODES
//=============================================================================

/// Stable error codes for business-rule translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Structure errors (001-019)
    /// Statement keyword matches no handler
    BR001,
    /// Indented line under a statement that does not open a block
    BR002,
    /// Statement group never closed (dangling call or `if`)
    BR003,
    /// Unbalanced brackets inside a statement
    BR004,

    // Control flow errors (020-039)
    /// Malformed `if any <item> in <collection> has <condition>`
    BR020,
    /// Malformed `for` header
    BR021,
    /// `else` / `elseif` without a preceding `if`
    BR022,
    /// Control-flow header without a condition
    BR023,
    /// `case` / `default` outside a `switch`, or a non-case inside one
    BR024,
    /// `elseif` following an `if any` block
    BR025,

    // Declaration errors (040-059)
    /// Malformed class declaration or member
    BR040,
    /// Malformed enum declaration or member
    BR041,
    /// Malformed interface declaration or member
    BR042,
    /// `{` body never closed
    BR043,

    // Expression errors (060-079)
    /// Malformed assignment
    BR060,
}

impl ErrorCode {
    /// Get the code as string
    pub fn code_str(&self) -> &'static str {
        match self {
            ErrorCode::BR001 => "BR001",
            ErrorCode::BR002 => "BR002",
            ErrorCode::BR003 => "BR003",
            ErrorCode::BR004 => "BR004",
            ErrorCode::BR020 => "BR020",
            ErrorCode::BR021 => "BR021",
            ErrorCode::BR022 => "BR022",
            ErrorCode::BR023 => "BR023",
            ErrorCode::BR024 => "BR024",
            ErrorCode::BR025 => "BR025",
            ErrorCode::BR040 => "BR040",
            ErrorCode::BR041 => "BR041",
            ErrorCode::BR042 => "BR042",
            ErrorCode::BR043 => "BR043",
            ErrorCode::BR060 => "BR060",
        }
    }

    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::BR001 | ErrorCode::BR002 | ErrorCode::BR003 | ErrorCode::BR004 => {
                ErrorCategory::Structure
            }
            ErrorCode::BR020
            | ErrorCode::BR021
            | ErrorCode::BR022
            | ErrorCode::BR023
            | ErrorCode::BR024
            | ErrorCode::BR025 => ErrorCategory::ControlFlow,
            ErrorCode::BR040 | ErrorCode::BR041 | ErrorCode::BR042 | ErrorCode::BR043 => {
                ErrorCategory::Declaration
            }
            ErrorCode::BR060 => ErrorCategory::Expression,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code_str())
    }
}

//=============================================================================
// TRANSPILE ERROR
//=============================================================================

/// A fatal translation error tied to a business-rule line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranspileError {
    #[error("line {line}: error[{code}]: unrecognized statement `{text}`")]
    UnrecognizedStatement { line: usize, code: ErrorCode, text: String },

    #[error("line {line}: error[{code}]: unexpected indentation under `{parent}`, which does not open a block")]
    UnexpectedIndent { line: usize, code: ErrorCode, parent: String },

    #[error("line {line}: error[{code}]: incomplete statement ({reason}); the statement never closes")]
    IncompleteStatement { line: usize, code: ErrorCode, reason: String },

    #[error("line {line}: error[{code}]: unbalanced brackets in `{text}`")]
    UnbalancedBrackets { line: usize, code: ErrorCode, text: String },

    #[error("line {line}: error[{code}]: {message}")]
    Syntax { line: usize, code: ErrorCode, message: String },
}

impl TranspileError {
    /// Build a syntax error with a specific code
    pub fn syntax(line: usize, code: ErrorCode, message: impl Into<String>) -> Self {
        TranspileError::Syntax { line, code, message: message.into() }
    }

    pub fn unrecognized(line: usize, text: &str) -> Self {
        TranspileError::UnrecognizedStatement {
            line,
            code: ErrorCode::BR001,
            text: text.to_string(),
        }
    }

    pub fn unexpected_indent(line: usize, parent: &str) -> Self {
        TranspileError::UnexpectedIndent {
            line,
            code: ErrorCode::BR002,
            parent: parent.to_string(),
        }
    }

    pub fn incomplete(line: usize, reason: &str) -> Self {
        TranspileError::IncompleteStatement {
            line,
            code: ErrorCode::BR003,
            reason: reason.to_string(),
        }
    }

    pub fn unbalanced(line: usize, text: &str) -> Self {
        TranspileError::UnbalancedBrackets {
            line,
            code: ErrorCode::BR004,
            text: text.to_string(),
        }
    }

    /// The 1-based business-rule line this error points at
    pub fn line(&self) -> usize {
        match self {
            TranspileError::UnrecognizedStatement { line, .. }
            | TranspileError::UnexpectedIndent { line, .. }
            | TranspileError::IncompleteStatement { line, .. }
            | TranspileError::UnbalancedBrackets { line, .. }
            | TranspileError::Syntax { line, .. } => *line,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TranspileError::UnrecognizedStatement { code, .. }
            | TranspileError::UnexpectedIndent { code, .. }
            | TranspileError::IncompleteStatement { code, .. }
            | TranspileError::UnbalancedBrackets { code, .. }
            | TranspileError::Syntax { code, .. } => *code,
        }
    }

    /// Render the error with the offending source line underneath,
    /// in the style of a compiler diagnostic.
    pub fn format_with_source(&self, source: &str) -> String {
        let line = self.line();
        let mut output = format!("{} [{}]\n", self, self.code().category());
        if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
            output.push_str("   |\n");
            output.push_str(&format!("{:3} | {}\n", line, text));
            output.push_str("   |\n");
        }
        output
    }
}

/// Convenience alias used across the transpiler
pub type Result<T> = std::result::Result<T, TranspileError>;
