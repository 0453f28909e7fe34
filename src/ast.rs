//! Business-Rule Statement Tree
//!
//! Every logical statement is classified exactly once into a
//! [`StatementKind`]; later stages match on the variant instead of
//! re-inspecting source text. Statements are arranged into a tree of
//! [`Node`]s by indentation: a node's children are the more-indented
//! statements that follow a block-opening header.
//!
//! ## Design Principles
//!
//! 1. **One classification point**: the parser decides what a statement is
//! 2. **Location tracking**: every statement keeps its business-rule lines
//! 3. **Exhaustive dispatch**: the generator matches every variant

use serde::Serialize;

//=============================================================================
// SOURCE LOCATION
//=============================================================================

/// Business-rule line range of a statement (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Span { start_line, end_line }
    }
}

//=============================================================================
// DECLARATIONS
//=============================================================================

/// `name: Type = value` inside a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMember {
    pub name: String,
    pub type_name: Option<String>,
    pub value: Option<String>,
    pub line: usize,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDecl {
    pub name: String,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumVariant {
    pub name: String,
    /// Explicit value; the variant name is used when absent
    pub value: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub name: String,
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InterfaceMember {
    Property {
        name: String,
        type_name: String,
        line: usize,
    },
    Method {
        name: String,
        params: Vec<Param>,
        return_type: Option<String>,
        line: usize,
    },
}

impl InterfaceMember {
    pub fn name(&self) -> &str {
        match self {
            InterfaceMember::Property { name, .. } | InterfaceMember::Method { name, .. } => name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            InterfaceMember::Property { line, .. } | InterfaceMember::Method { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<String>,
    pub members: Vec<InterfaceMember>,
}

//=============================================================================
// STATEMENTS
//=============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ForIterable {
    /// `for x in items`
    Collection { expr: String },
    /// `for i = 1 to 10 step 2` (inclusive end)
    Range {
        start: String,
        end: String,
        step: Option<String>,
    },
}

/// What a statement is. Conditions and expressions hold business-rule
/// text; translation happens at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StatementKind {
    If { condition: String },
    ElseIf { condition: String },
    Else,
    IfAny {
        item: String,
        collection: String,
        condition: String,
    },
    For { variable: String, iterable: ForIterable },
    While { condition: String },
    Switch { subject: String },
    Case { values: Vec<String> },
    Default,
    ClassDecl(ClassDecl),
    EnumDecl(EnumDecl),
    InterfaceDecl(InterfaceDecl),
    Assignment {
        target: String,
        op: String,
        value: String,
    },
    SqlAssignment { target: String, query: String },
    Expression { text: String },
    Return { value: Option<String> },
    Break,
    Continue,
    Pass,
    Comment { text: String },
}

impl StatementKind {
    /// Does this statement own the more-indented statements after it?
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            StatementKind::If { .. }
                | StatementKind::ElseIf { .. }
                | StatementKind::Else
                | StatementKind::IfAny { .. }
                | StatementKind::For { .. }
                | StatementKind::While { .. }
                | StatementKind::Switch { .. }
                | StatementKind::Case { .. }
                | StatementKind::Default
        )
    }

    /// Short name used in logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::If { .. } => "if",
            StatementKind::ElseIf { .. } => "elseif",
            StatementKind::Else => "else",
            StatementKind::IfAny { .. } => "if-any",
            StatementKind::For { .. } => "for",
            StatementKind::While { .. } => "while",
            StatementKind::Switch { .. } => "switch",
            StatementKind::Case { .. } => "case",
            StatementKind::Default => "default",
            StatementKind::ClassDecl(_) => "class",
            StatementKind::EnumDecl(_) => "enum",
            StatementKind::InterfaceDecl(_) => "interface",
            StatementKind::Assignment { .. } => "assignment",
            StatementKind::SqlAssignment { .. } => "sql-assignment",
            StatementKind::Expression { .. } => "expression",
            StatementKind::Return { .. } => "return",
            StatementKind::Break => "break",
            StatementKind::Continue => "continue",
            StatementKind::Pass => "pass",
            StatementKind::Comment { .. } => "comment",
        }
    }
}

/// One classified statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
    /// Leading whitespace width of the first line
    pub indent: usize,
    /// Non-blank business-rule lines this statement covers
    pub line_count: usize,
    /// Trimmed source text, lines joined by spaces
    pub source: String,
}

impl Statement {
    pub fn line(&self) -> usize {
        self.span.start_line
    }
}

/// A statement and the block it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub statement: Statement,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(statement: Statement) -> Self {
        Node { statement, children: Vec::new() }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.statement.kind
    }

    /// Business-rule lines covered by this node and its whole subtree
    pub fn total_lines(&self) -> usize {
        self.statement.line_count + self.children.iter().map(Node::total_lines).sum::<usize>()
    }

    /// Depth-first walk over this node and its descendants
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
