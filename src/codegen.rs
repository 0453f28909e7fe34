//! Statement Code Generator
//!
//! Walks the statement tree and emits Python. Indentation comes from
//! nesting depth only (`depth * 4` spaces), never from generated text.
//!
//! ## Dispatch
//!
//! Each top-level dispatch step handles one statement node together with
//! its whole block. An `if any` step also consumes the `else` sibling that
//! belongs to it. Every step reports the business-rule lines it consumed;
//! together the steps account for every non-blank line exactly once.
//!
//! ## Validation
//!
//! The generator rejects structure Python cannot express:
//! - `elseif` / `else` without a preceding `if` (`BR022`)
//! - `case` / `default` outside a `switch`, anything else inside one, or
//!   a `case` after `default` (`BR024`)
//! - `elseif` after `if any` (`BR025`)
//!
//! ## Source map
//!
//! Every emitted statement records its business-rule lines and the
//! contiguous range of Python lines it produced. A block header's range
//! covers the `pass` of an empty block. Instrumentation calls belong to the
//! statement they instrument.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::ast::{Node, Statement, StatementKind};
use crate::error_msg::{ErrorCode, Result, TranspileError};
use crate::grouping::StatementGroup;
use crate::indentation::{depth_to_spaces, indent, IfAnyHeader, IfAnyLayout};
use crate::instrument;
use crate::options::TranspileOptions;
use crate::parser::{parse_program, ParsedProgram};
use crate::source_map::{BusinessRuleSourceMap, LineRange, SourceMapBuilder};
use crate::translate::*;
use crate::type_registry::TypeRegistry;

/// One top-level step of the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStep {
    pub business_line: usize,
    pub kind: &'static str,
    /// Non-blank business-rule lines handled by this step
    pub consumed_lines: usize,
    /// Python lines emitted by this step
    pub generated_lines: usize,
}

/// Lines produced for a single statement group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutput {
    pub lines: Vec<String>,
    pub consumed_lines: usize,
}

/// Result of generating a whole program
#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    pub code: String,
    pub source_map: BusinessRuleSourceMap,
    pub steps: Vec<DispatchStep>,
}

/// What the enclosing block allows as children
#[derive(Debug, Clone, Copy)]
enum Block<'n> {
    Plain,
    Switch { subject: &'n str },
}

/// Emits Python for a parsed business rule
pub struct CodeGenerator<'a> {
    options: &'a TranspileOptions,
    registry: &'a TypeRegistry,
    out: Vec<String>,
    map: SourceMapBuilder,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(options: &'a TranspileOptions, registry: &'a TypeRegistry) -> Self {
        CodeGenerator {
            options,
            registry,
            out: Vec::new(),
            map: SourceMapBuilder::new(),
        }
    }

    /// Generate the full program
    pub fn generate(mut self, program: &ParsedProgram, business_source: &str) -> Result<GeneratedProgram> {
        let imports = collect_imports(&program.nodes);
        for import in &imports {
            self.out.push((*import).to_string());
        }
        if !imports.is_empty() {
            self.out.push(String::new());
        }

        let base_depth = if self.options.instrument {
            self.out.extend(instrument::prelude());
            instrument::BODY_DEPTH
        } else {
            0
        };

        let body_start = self.out.len();
        let steps = self.emit_siblings(&program.nodes, base_depth, Block::Plain)?;
        if self.options.instrument {
            if self.out.len() == body_start {
                self.push(base_depth, "pass");
            }
            self.out.extend(instrument::epilogue());
        }

        let mut code = self.out.join("\n");
        if !code.is_empty() {
            code.push('\n');
        }
        self.map.set_business_content(business_source);
        self.map.set_python_content(&code);

        Ok(GeneratedProgram {
            code,
            source_map: self.map.build(),
            steps,
        })
    }

    /// Generate the lines of a single statement group at depth zero.
    /// Block headers get a `pass` body.
    pub fn emit_group(mut self, group: &StatementGroup) -> Result<HandlerOutput> {
        let program = parse_program(std::slice::from_ref(group), self.options.reject_incomplete)?;
        let steps = self.emit_siblings(&program.nodes, 0, Block::Plain)?;
        Ok(HandlerOutput {
            lines: self.out,
            consumed_lines: steps.iter().map(|s| s.consumed_lines).sum(),
        })
    }

    //=========================================================================
    // OUTPUT
    //=========================================================================

    /// Append a line at `depth`; returns its 1-based Python line number
    fn push(&mut self, depth: usize, text: impl AsRef<str>) -> usize {
        self.out.push(format!("{}{}", indent(depth_to_spaces(depth)), text.as_ref()));
        self.out.len()
    }

    fn record(&mut self, stmt: &Statement, start: usize, end: usize) {
        self.record_lines(stmt.span.start_line, stmt.span.end_line, start, end);
    }

    fn record_lines(&mut self, business_line: usize, business_end_line: usize, start: usize, end: usize) {
        self.map
            .add_statement(business_line, business_end_line, LineRange::new(start, end));
    }

    /// Emit a simple statement line, followed by its step call when
    /// instrumenting, and map both to `business_line..=business_end`
    fn emit_simple(&mut self, business_line: usize, business_end: usize, depth: usize, text: String, source: &str) {
        let line = self.push(depth, text);
        let mut end = line;
        if self.options.instrument {
            end = self.push(depth, instrument::step_call(business_line, line, source));
        }
        self.record_lines(business_line, business_end, line, end);
    }

    /// Emit a jump, preceded by its step call when instrumenting
    fn emit_jump(&mut self, business_line: usize, business_end: usize, depth: usize, text: String, source: &str) {
        let start = self.out.len() + 1;
        if self.options.instrument {
            self.push(depth, instrument::step_call(business_line, start + 1, source));
        }
        let end = self.push(depth, text);
        self.record_lines(business_line, business_end, start, end);
    }

    //=========================================================================
    // DISPATCH
    //=========================================================================

    fn emit_siblings(&mut self, nodes: &[Node], depth: usize, block: Block<'_>) -> Result<Vec<DispatchStep>> {
        let mut steps = Vec::new();
        // Did the last non-comment sibling leave an `if` chain open?
        let mut chain_open = false;
        let mut seen_default = false;
        let mut i = 0;

        while i < nodes.len() {
            let node = &nodes[i];
            let kind = node.kind();
            let line = node.statement.line();
            let out_before = self.out.len();

            if let Block::Switch { .. } = block {
                match kind {
                    StatementKind::Case { .. } if seen_default => {
                        return Err(TranspileError::syntax(line, ErrorCode::BR024, "`case` after `default`"));
                    }
                    StatementKind::Case { .. } | StatementKind::Comment { .. } => {}
                    StatementKind::Default => seen_default = true,
                    _ => {
                        return Err(TranspileError::syntax(
                            line,
                            ErrorCode::BR024,
                            format!("only `case` and `default` may appear inside `switch`, found `{}`", kind.name()),
                        ));
                    }
                }
            }

            let consumed_nodes = match kind {
                StatementKind::Comment { .. } => {
                    self.emit_node(node, depth, block)?;
                    1
                }
                StatementKind::ElseIf { .. } | StatementKind::Else if !chain_open => {
                    return Err(TranspileError::syntax(
                        line,
                        ErrorCode::BR022,
                        format!("`{}` without a preceding `if`", kind.name()),
                    ));
                }
                StatementKind::IfAny { item, collection, condition } => {
                    chain_open = false;
                    let header = IfAnyHeader {
                        item: item.clone(),
                        collection: collection.clone(),
                        condition: condition.clone(),
                    };
                    self.emit_if_any(nodes, i, &header, depth)?
                }
                _ => {
                    chain_open = matches!(kind, StatementKind::If { .. } | StatementKind::ElseIf { .. });
                    self.emit_node(node, depth, block)?;
                    1
                }
            };

            let consumed_lines = nodes[i..i + consumed_nodes].iter().map(Node::total_lines).sum();
            log::debug!(
                "line {}: {} consumed {} line(s), emitted {} line(s)",
                line,
                kind.name(),
                consumed_lines,
                self.out.len() - out_before
            );
            steps.push(DispatchStep {
                business_line: line,
                kind: kind.name(),
                consumed_lines,
                generated_lines: self.out.len() - out_before,
            });
            i += consumed_nodes;
        }

        Ok(steps)
    }

    /// Emit one node and its block
    fn emit_node(&mut self, node: &Node, depth: usize, block: Block<'_>) -> Result<()> {
        let stmt = &node.statement;
        let children = node.children.as_slice();

        match &stmt.kind {
            StatementKind::If { condition } => self.emit_block(stmt, if_header(condition), children, depth, Block::Plain),
            StatementKind::ElseIf { condition } => {
                self.emit_block(stmt, elif_header(condition), children, depth, Block::Plain)
            }
            StatementKind::Else => self.emit_block(stmt, ELSE_HEADER.to_string(), children, depth, Block::Plain),
            StatementKind::For { variable, iterable } => {
                self.emit_block(stmt, for_header(variable, iterable), children, depth, Block::Plain)
            }
            StatementKind::While { condition } => {
                self.emit_block(stmt, while_header(condition), children, depth, Block::Plain)
            }
            StatementKind::Switch { subject } => self.emit_switch(stmt, subject, children, depth),
            StatementKind::Case { values } => {
                let subject = match block {
                    Block::Switch { subject } => subject,
                    Block::Plain => return Err(case_outside_switch(stmt)),
                };
                self.emit_block(stmt, case_header(values, subject), children, depth, Block::Plain)
            }
            StatementKind::Default => match block {
                Block::Switch { .. } => {
                    self.emit_block(stmt, DEFAULT_CASE_HEADER.to_string(), children, depth, Block::Plain)
                }
                Block::Plain => Err(case_outside_switch(stmt)),
            },
            StatementKind::IfAny { .. } => Err(TranspileError::syntax(
                stmt.line(),
                ErrorCode::BR020,
                "`if any` must be emitted with its siblings",
            )),
            StatementKind::ClassDecl(decl) => {
                let header = self.push(depth, class_header(decl));
                if decl.members.is_empty() {
                    let pass = self.push(depth + 1, "pass");
                    self.record_lines(stmt.line(), stmt.line(), header, pass);
                    return Ok(());
                }
                self.record_lines(stmt.line(), stmt.line(), header, header);
                for member in &decl.members {
                    let text = class_member_line(member, self.registry);
                    self.emit_simple(member.line, member.line, depth + 1, text, &member.source);
                }
                Ok(())
            }
            StatementKind::EnumDecl(decl) => {
                let header = self.push(depth, enum_header(&decl.name));
                if decl.variants.is_empty() {
                    let pass = self.push(depth + 1, "pass");
                    self.record_lines(stmt.line(), stmt.line(), header, pass);
                    return Ok(());
                }
                self.record_lines(stmt.line(), stmt.line(), header, header);
                for variant in &decl.variants {
                    let line = self.push(depth + 1, enum_variant_line(variant));
                    self.record_lines(variant.line, variant.line, line, line);
                }
                Ok(())
            }
            StatementKind::InterfaceDecl(decl) => {
                let header = self.push(depth, interface_header(decl));
                if decl.members.is_empty() {
                    let pass = self.push(depth + 1, "pass");
                    self.record_lines(stmt.line(), stmt.line(), header, pass);
                    return Ok(());
                }
                self.record_lines(stmt.line(), stmt.line(), header, header);
                for member in &decl.members {
                    let line = self.push(depth + 1, interface_member_line(member));
                    self.record_lines(member.line(), member.line(), line, line);
                }
                Ok(())
            }
            StatementKind::Assignment { target, op, value } => {
                let text = assignment_line(target, op, value);
                self.emit_simple(stmt.span.start_line, stmt.span.end_line, depth, text, &stmt.source);
                Ok(())
            }
            StatementKind::SqlAssignment { target, query } => {
                let text = sql_assignment_line(target, query, &self.options.sql_function);
                self.emit_simple(stmt.span.start_line, stmt.span.end_line, depth, text, &stmt.source);
                Ok(())
            }
            StatementKind::Expression { text } => {
                let text = expression_line(text);
                self.emit_simple(stmt.span.start_line, stmt.span.end_line, depth, text, &stmt.source);
                Ok(())
            }
            StatementKind::Return { value } => {
                let text = return_line(value.as_deref());
                self.emit_jump(stmt.span.start_line, stmt.span.end_line, depth, text, &stmt.source);
                Ok(())
            }
            StatementKind::Break => {
                self.emit_jump(stmt.span.start_line, stmt.span.end_line, depth, "break".to_string(), &stmt.source);
                Ok(())
            }
            StatementKind::Continue => {
                self.emit_jump(stmt.span.start_line, stmt.span.end_line, depth, "continue".to_string(), &stmt.source);
                Ok(())
            }
            StatementKind::Pass => {
                let line = self.push(depth, "pass");
                self.record(stmt, line, line);
                Ok(())
            }
            StatementKind::Comment { text } => {
                let line = self.push(depth, comment_line(text));
                self.record(stmt, line, line);
                Ok(())
            }
        }
    }

    /// A header and its indented body; an empty body becomes `pass`
    fn emit_block(
        &mut self,
        stmt: &Statement,
        header: String,
        children: &[Node],
        depth: usize,
        block: Block<'_>,
    ) -> Result<()> {
        let line = self.push(depth, header);
        if children.is_empty() {
            let pass = self.push(depth + 1, "pass");
            self.record(stmt, line, pass);
            return Ok(());
        }

        self.record(stmt, line, line);
        self.emit_siblings(children, depth + 1, block)?;
        if children.iter().all(is_comment) {
            let pass = self.push(depth + 1, "pass");
            self.record(stmt, pass, pass);
        }
        Ok(())
    }

    fn emit_switch(&mut self, stmt: &Statement, subject: &str, children: &[Node], depth: usize) -> Result<()> {
        let line = self.push(depth, match_header(subject));
        // A `match` needs at least one case
        if children.is_empty() {
            self.push(depth + 1, DEFAULT_CASE_HEADER);
            let pass = self.push(depth + 2, "pass");
            self.record(stmt, line, pass);
            return Ok(());
        }

        self.record(stmt, line, line);
        self.emit_siblings(children, depth + 1, Block::Switch { subject })?;
        if children.iter().all(is_comment) {
            let case = self.push(depth + 1, DEFAULT_CASE_HEADER);
            let pass = self.push(depth + 2, "pass");
            self.record(stmt, case, pass);
        }
        Ok(())
    }

    /// `if any` expansion. Consumes the `else` sibling that belongs to it;
    /// returns the number of sibling nodes consumed.
    fn emit_if_any(&mut self, nodes: &[Node], idx: usize, header: &IfAnyHeader, depth: usize) -> Result<usize> {
        let node = &nodes[idx];
        let stmt = &node.statement;
        let base = depth_to_spaces(depth);
        let layout = IfAnyLayout::at(base);
        let condition_depth = depth + 1;

        let loop_line = self.push(depth, header.loop_header());
        let if_line = self.push(condition_depth, header.condition_header());
        debug_assert_eq!(layout.condition_indent, depth_to_spaces(condition_depth));

        if node.children.is_empty() {
            let pass = self.push(condition_depth + 1, "pass");
            self.record(stmt, loop_line, pass);
        } else {
            self.record(stmt, loop_line, if_line);
            self.emit_siblings(&node.children, condition_depth + 1, Block::Plain)?;
            if node.children.iter().all(is_comment) {
                let pass = self.push(condition_depth + 1, "pass");
                self.record(stmt, pass, pass);
            }
        }

        // `break` sits at the `if` line's own indentation
        debug_assert_eq!(layout.break_indent, depth_to_spaces(condition_depth));
        self.emit_jump(stmt.line(), stmt.line(), condition_depth, "break".to_string(), "break");

        // The else clause is the next non-comment sibling, if it is `else`
        let mut next = idx + 1;
        while next < nodes.len() && is_comment(&nodes[next]) {
            next += 1;
        }
        match nodes.get(next).map(Node::kind) {
            Some(StatementKind::Else) => {
                for comment in &nodes[idx + 1..next] {
                    self.emit_node(comment, depth, Block::Plain)?;
                }
                let else_node = &nodes[next];
                self.emit_block(
                    &else_node.statement,
                    ELSE_HEADER.to_string(),
                    &else_node.children,
                    depth,
                    Block::Plain,
                )?;
                Ok(next - idx + 1)
            }
            Some(StatementKind::ElseIf { .. }) => Err(TranspileError::syntax(
                nodes[next].statement.line(),
                ErrorCode::BR025,
                "`elseif` cannot follow `if any`; use `else` with a nested `if`",
            )),
            _ => Ok(1),
        }
    }
}

fn is_comment(node: &Node) -> bool {
    matches!(node.kind(), StatementKind::Comment { .. })
}

fn case_outside_switch(stmt: &Statement) -> TranspileError {
    TranspileError::syntax(
        stmt.line(),
        ErrorCode::BR024,
        format!("`{}` outside of `switch`", stmt.kind.name()),
    )
}

/// Imports the generated declarations need, in a stable order
fn collect_imports(nodes: &[Node]) -> BTreeSet<&'static str> {
    let mut imports = BTreeSet::new();
    for node in nodes {
        node.walk(&mut |n| match n.kind() {
            StatementKind::EnumDecl(_) => {
                imports.insert(ENUM_IMPORT);
            }
            StatementKind::InterfaceDecl(_) => {
                imports.insert(PROTOCOL_IMPORT);
            }
            _ => {}
        });
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::StatementGrouper;
    use crate::indentation::measured_indent;
    use crate::source_map::SourceMapConsumer;

    fn generate_with(text: &str, options: &TranspileOptions) -> Result<GeneratedProgram> {
        let groups = StatementGrouper::new().group_statements(text);
        let program = parse_program(&groups, options.reject_incomplete)?;
        let registry = TypeRegistry::build(&program.nodes, &options.modules, &options.global_objects);
        CodeGenerator::new(options, &registry).generate(&program, text)
    }

    fn generate(text: &str) -> Result<GeneratedProgram> {
        generate_with(text, &TranspileOptions::default())
    }

    fn lines(program: &GeneratedProgram) -> Vec<&str> {
        program.code.lines().collect()
    }

    #[test]
    fn test_if_elseif_else() {
        let out = generate("if a = 1\n  x = 1\nelseif a = 2\n  x = 2\nelse\n  x = 3").expect("generates");
        assert_eq!(
            lines(&out),
            vec!["if a == 1:", "    x = 1", "elif a == 2:", "    x = 2", "else:", "    x = 3"]
        );
    }

    #[test]
    fn test_if_any_with_else() {
        let text = "if any testcls in testClasses has testcls.age = 4\n  air = \"\"\nelse\n  air = \"RR\"";
        let out = generate(text).expect("generates");
        assert_eq!(
            lines(&out),
            vec![
                "for testcls in testClasses:",
                "    if testcls.age == 4:",
                "        air = \"\"",
                "        break",
                "else:",
                "    air = \"RR\"",
            ]
        );
        assert_eq!(out.steps.len(), 1);
        assert_eq!(out.steps[0].consumed_lines, 4);
    }

    #[test]
    fn test_nested_if_any_keeps_break_on_if_indent() {
        let text = "for g in groups\n  if g.active\n    if any m in g.members has m.age > 60\n      if m.vip\n        seniors = seniors + 1\n      elseif m.new\n        fresh = 1\n    else\n      found = false";
        let out = generate(text).expect("generates");
        let code = lines(&out);
        let if_line = code.iter().position(|l| l.trim() == "if m.age > 60:").expect("if line");
        let break_line = code.iter().position(|l| l.trim() == "break").expect("break line");
        let for_line = code.iter().position(|l| l.trim() == "for m in g.members:").expect("for line");
        let else_line = code.iter().rposition(|l| l.trim() == "else:").expect("else line");
        assert_eq!(measured_indent(code[break_line]), measured_indent(code[if_line]));
        assert_eq!(measured_indent(code[if_line]), measured_indent(code[for_line]) + 4);
        assert_eq!(measured_indent(code[else_line]), measured_indent(code[for_line]));
        assert_eq!(measured_indent(code[for_line]), 8);
        assert!(code.contains(&"                    seniors = seniors + 1"));
        assert!(code.contains(&"                elif m.new:"));
        assert!(code.contains(&"            found = False"));
    }

    #[test]
    fn test_if_any_without_else_still_breaks() {
        let out = generate("if any o in orders has o.total > 100\n  flagged = true\ncount = 1").expect("generates");
        assert_eq!(
            lines(&out),
            vec![
                "for o in orders:",
                "    if o.total > 100:",
                "        flagged = True",
                "        break",
                "count = 1",
            ]
        );
    }

    #[test]
    fn test_elseif_after_if_any_rejected() {
        let err = generate("if any o in orders has o.x = 1\n  y = 1\nelseif z = 2\n  y = 2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR025);
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_else_without_if() {
        let err = generate("x = 1\nelse\n  y = 2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR022);
        assert_eq!(err.line(), 2);

        let err = generate("if a\n  b = 1\nelse\n  b = 2\nelse\n  b = 3").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR022);
        assert_eq!(err.line(), 5);
    }

    #[test]
    fn test_switch() {
        let text = "switch status\n  case \"new\", \"open\"\n    active = true\n  case LIMIT\n    capped = true\n  default\n    active = false";
        let out = generate(text).expect("generates");
        assert_eq!(
            lines(&out),
            vec![
                "match status:",
                "    case \"new\" | \"open\":",
                "        active = True",
                "    case _ if status == LIMIT:",
                "        capped = True",
                "    case _:",
                "        active = False",
            ]
        );
    }

    #[test]
    fn test_switch_validation() {
        assert_eq!(generate("case 1\n  x = 1").unwrap_err().code(), ErrorCode::BR024);
        assert_eq!(generate("switch s\n  x = 1").unwrap_err().code(), ErrorCode::BR024);
        let err = generate("switch s\n  default\n    x = 1\n  case 2\n    x = 2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BR024);
        assert_eq!(err.line(), 4);
    }

    #[test]
    fn test_empty_blocks_get_pass() {
        let out = generate("while running\nswitch s").expect("generates");
        assert_eq!(
            lines(&out),
            vec!["while running:", "    pass", "match s:", "    case _:", "        pass"]
        );
    }

    #[test]
    fn test_declarations_and_imports() {
        let text = "enum Tier { GOLD, SILVER }\ninterface Priced {\n  price: number\n}\nclass Item implements Priced {\n  price: number\n  name = \"x\"\n}";
        let out = generate(text).expect("generates");
        assert_eq!(
            lines(&out),
            vec![
                "from enum import Enum",
                "from typing import Protocol",
                "",
                "class Tier(Enum):",
                "    GOLD = \"GOLD\"",
                "    SILVER = \"SILVER\"",
                "class Priced(Protocol):",
                "    price: float",
                "class Item(Priced):",
                "    price: float = 0",
                "    name = \"x\"",
            ]
        );
    }

    #[test]
    fn test_sql_and_range_loop() {
        let options = TranspileOptions::default().with_sql_function("db.query");
        let out = generate_with("rows = SELECT * FROM orders\nfor i = 1 to 3\n  total += i", &options)
            .expect("generates");
        assert_eq!(
            lines(&out),
            vec![
                "rows = db.query(\"SELECT * FROM orders\")",
                "for i in range(1, 4):",
                "    total += i",
            ]
        );
    }

    #[test]
    fn test_line_accounting() {
        let text = "// header\nx = a +\n  b\n\nif any o in orders has o.ok\n  y = 1\n// between\nelse\n  y = 2\nclass C {\n  v = 1\n}\nnotify(x,\n  y)";
        let groups = StatementGrouper::new().group_statements(text);
        let non_blank: usize = groups.iter().map(StatementGroup::line_count).sum();
        let out = generate(text).expect("generates");
        let consumed: usize = out.steps.iter().map(|s| s.consumed_lines).sum();
        assert_eq!(consumed, non_blank);
        assert_eq!(non_blank, text.lines().filter(|l| !l.trim().is_empty()).count());
    }

    #[test]
    fn test_source_map_ranges_map_back() {
        let text = "x = 1\nif any o in orders has o.ok\n  y = 1\nelse\n  y = 2\nclass C {\n  v: string\n}\nwhile x < 3\n";
        for instrument in [false, true] {
            let options = TranspileOptions::default().with_instrument(instrument);
            let out = generate_with(text, &options).expect("generates");
            let consumer = SourceMapConsumer::new(out.source_map.clone());
            for stmt in &out.source_map.statements {
                for line in stmt.python_lines.lines() {
                    assert_eq!(consumer.python_to_business(line), Some(stmt.business_line));
                }
            }
            let break_line = out.code.lines().position(|l| l.trim() == "break").expect("break") + 1;
            assert_eq!(consumer.python_to_business(break_line), Some(2));
        }
    }

    #[test]
    fn test_fallback_lines_are_mapped() {
        let text = "if ready\n  // later\nswitch kind\n  // none\nif any o in os has o.ok\n  // todo\nwhile w";
        let out = generate(text).expect("generates");
        assert_eq!(
            lines(&out),
            vec![
                "if ready:",
                "    # later",
                "    pass",
                "match kind:",
                "    # none",
                "    case _:",
                "        pass",
                "for o in os:",
                "    if o.ok:",
                "        # todo",
                "        pass",
                "        break",
                "while w:",
                "    pass",
            ]
        );
        let consumer = SourceMapConsumer::new(out.source_map.clone());
        let mapped: Vec<Option<usize>> = (1..=14).map(|line| consumer.python_to_business(line)).collect();
        assert_eq!(
            mapped,
            vec![1, 2, 1, 3, 4, 3, 3, 5, 5, 6, 5, 5, 7, 7].into_iter().map(Some).collect::<Vec<_>>()
        );
        assert_eq!(consumer.business_to_python(3), Some(&[4, 6, 7][..]));
    }

    #[test]
    fn test_instrumented_output() {
        let options = TranspileOptions::default().with_instrument(true);
        let out = generate_with("air = \"123\"\nif any t in ts has t.age = 4\n  air = \"\"", &options)
            .expect("generates");
        let code = lines(&out);
        let try_line = code.iter().rposition(|l| *l == "try:").expect("try") + 1;
        assert_eq!(code[try_line], "    air = \"123\"");
        assert_eq!(
            code[try_line + 1],
            format!("    __STEP_CONTROL__(\"STMT_1\", {}, 1, \"air = \\\"123\\\"\")", try_line + 1)
        );
        let break_idx = code.iter().position(|l| l.trim() == "break").expect("break");
        assert!(code[break_idx - 1].trim().starts_with("__STEP_CONTROL__(\"STMT_2\""));
        assert_eq!(
            code.last().copied(),
            Some("__STEP_CONTROL__(\"COMPLETE\", 0, 0, \"Execution completed\")")
        );
        assert!(code.contains(&"except Exception as e:"));
    }

    #[test]
    fn test_emit_group_handler() {
        let groups = StatementGrouper::new().group_statements("total = price *\n  qty");
        let options = TranspileOptions::default();
        let registry = TypeRegistry::new();
        let output = CodeGenerator::new(&options, &registry).emit_group(&groups[0]).expect("emits");
        assert_eq!(output.lines, vec!["total = price * qty"]);
        assert_eq!(output.consumed_lines, 2);
    }
}
