//! Indentation Engine
//!
//! Generated Python indentation is derived only from nesting depth: a
//! block's body sits exactly [`INDENT_WIDTH`] spaces deeper than its
//! header. Nothing is ever measured from already-generated text.
//!
//! ## `if any`
//!
//! ```text
//! if any testcls in testClasses has testcls.age = 4
//!   air = ""
//! else
//!   air = "RR"
//! ```
//!
//! becomes a `for`/`else` search loop:
//!
//! ```text
//! for testcls in testClasses:        # base
//!     if testcls.age == 4:           # base + 4
//!         air = ""                   # base + 8
//!         break                      # base + 4, NOT base + 8
//! else:                              # base
//!     air = "RR"                     # base + 4
//! ```
//!
//! The `break` is emitted at the `if` line's own indentation. The
//! generator places the nested business-rule content at `body_indent` by
//! recursing one level deeper, so arbitrarily deep `if`/`elseif`/`else`
//! nesting inside the block keeps its relative shape.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error_msg::{ErrorCode, Result, TranspileError};
use crate::helpers::INDENT_WIDTH;
use crate::translate::condition_translate::translate_condition;

static IF_ANY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:if)\s+(?i:any)\s+(\w+)\s+(?i:in)\s+([\w.]+)\s+(?i:has)\s+(.+)$")
        .expect("valid regex")
});

/// Whitespace for an indentation of `spaces`
pub fn indent(spaces: usize) -> String {
    " ".repeat(spaces)
}

/// Indentation in spaces for a nesting depth
pub fn depth_to_spaces(depth: usize) -> usize {
    depth * INDENT_WIDTH
}

/// Indentation of a block body under a header at `base`
pub fn child_indent(base: usize) -> usize {
    base + INDENT_WIDTH
}

/// Does this statement start with `if any`?
pub fn is_if_any(code: &str) -> bool {
    let lower = code.trim_start().to_lowercase();
    lower.starts_with("if any ") || lower == "if any"
}

/// Parsed `if any <item> in <collection> has <condition>` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfAnyHeader {
    pub item: String,
    pub collection: String,
    /// Business-rule condition text, untranslated
    pub condition: String,
}

impl IfAnyHeader {
    /// Parse the header; anything off-grammar is a syntax error at `line`
    pub fn parse(code: &str, line: usize) -> Result<Self> {
        let code = code.trim();
        let code = if code.to_lowercase().ends_with(" then") {
            code[..code.len() - " then".len()].trim_end()
        } else {
            code
        };

        let caps = IF_ANY.captures(code).ok_or_else(|| {
            TranspileError::syntax(
                line,
                ErrorCode::BR020,
                format!(
                    "malformed `if any` (expected `if any <item> in <collection> has <condition>`): `{}`",
                    code
                ),
            )
        })?;

        Ok(IfAnyHeader {
            item: caps[1].to_string(),
            collection: caps[2].to_string(),
            condition: caps[3].trim().to_string(),
        })
    }

    /// `for <item> in <collection>:`
    pub fn loop_header(&self) -> String {
        format!("for {} in {}:", self.item, self.collection)
    }

    /// `if <translated condition>:`
    pub fn condition_header(&self) -> String {
        format!("if {}:", translate_condition(&self.condition))
    }
}

/// Indentation of every part of an `if any` expansion, in spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfAnyLayout {
    pub loop_indent: usize,
    pub condition_indent: usize,
    pub body_indent: usize,
    pub break_indent: usize,
    pub else_indent: usize,
    pub else_body_indent: usize,
}

impl IfAnyLayout {
    /// Layout for an `if any` whose generated `for` sits at `base`
    pub fn at(base: usize) -> Self {
        let condition_indent = child_indent(base);
        IfAnyLayout {
            loop_indent: base,
            condition_indent,
            body_indent: child_indent(condition_indent),
            break_indent: condition_indent,
            else_indent: base,
            else_body_indent: child_indent(base),
        }
    }
}

/// Leading whitespace width of a generated line
pub fn measured_indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}
