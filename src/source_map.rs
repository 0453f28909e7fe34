//! Source Map - Maps generated Python back to business-rule lines
//!
//! The generator records one [`SourceMapStatement`] per emitted statement:
//! the business-rule line range it came from and the contiguous range of
//! Python lines it produced. [`SourceMapConsumer`] indexes a finished map
//! for the debugger: breakpoint translation (business → Python) and
//! stepping or error reporting (Python → business).
//!
//! All line numbers are 1-based. A finished map is immutable; a changed
//! rule needs a fresh translation and a fresh consumer.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Format version written into every map
pub const SOURCE_MAP_VERSION: u32 = 1;

static TRACEBACK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"File "[^"]*", line (\d+)"#).expect("valid regex"));

/// Inclusive range of generated Python lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        LineRange { start, end }
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }

    pub fn lines(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

/// One emitted statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapStatement {
    /// `stmt_1`, `stmt_2`, ... in emission order
    pub id: String,
    pub business_line: usize,
    pub business_end_line: usize,
    pub python_lines: LineRange,
}

/// A finished source map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRuleSourceMap {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub business_line_count: usize,
    pub python_line_count: usize,
    pub statements: Vec<SourceMapStatement>,
}

impl BusinessRuleSourceMap {
    /// A map with no statements, used when translation fails
    pub fn empty() -> Self {
        BusinessRuleSourceMap {
            version: SOURCE_MAP_VERSION,
            generated_at: Utc::now(),
            business_line_count: 0,
            python_line_count: 0,
            statements: Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

//=============================================================================
// BUILDER
//=============================================================================

/// Builder for source maps during code generation
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    statements: Vec<SourceMapStatement>,
    business_line_count: usize,
    python_line_count: usize,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a statement and return its id
    pub fn add_statement(&mut self, business_line: usize, business_end_line: usize, python_lines: LineRange) -> String {
        let id = format!("stmt_{}", self.statements.len() + 1);
        self.statements.push(SourceMapStatement {
            id: id.clone(),
            business_line,
            business_end_line: business_end_line.max(business_line),
            python_lines,
        });
        id
    }

    pub fn set_business_content(&mut self, content: &str) {
        self.business_line_count = content.lines().count();
    }

    pub fn set_python_content(&mut self, content: &str) {
        self.python_line_count = content.lines().count();
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn build(self) -> BusinessRuleSourceMap {
        BusinessRuleSourceMap {
            version: SOURCE_MAP_VERSION,
            generated_at: Utc::now(),
            business_line_count: self.business_line_count,
            python_line_count: self.python_line_count,
            statements: self.statements,
        }
    }
}

//=============================================================================
// CONSUMER
//=============================================================================

/// Read-only lookup tables over a finished map
#[derive(Debug, Clone)]
pub struct SourceMapConsumer {
    map: BusinessRuleSourceMap,
    business_to_python: HashMap<usize, Vec<usize>>,
    python_to_business: BTreeMap<usize, usize>,
    statement_by_business: HashMap<usize, usize>,
    statement_by_python: HashMap<usize, usize>,
}

impl SourceMapConsumer {
    pub fn new(map: BusinessRuleSourceMap) -> Self {
        let mut business_to_python: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut python_to_business = BTreeMap::new();
        let mut statement_by_business = HashMap::new();
        let mut statement_by_python = HashMap::new();

        for (idx, stmt) in map.statements.iter().enumerate() {
            for business in stmt.business_line..=stmt.business_end_line {
                business_to_python
                    .entry(business)
                    .or_default()
                    .extend(stmt.python_lines.lines());
                statement_by_business.entry(business).or_insert(idx);
            }
            for python in stmt.python_lines.lines() {
                python_to_business.entry(python).or_insert(stmt.business_line);
                statement_by_python.entry(python).or_insert(idx);
            }
        }

        for lines in business_to_python.values_mut() {
            lines.sort_unstable();
            lines.dedup();
        }

        SourceMapConsumer {
            map,
            business_to_python,
            python_to_business,
            statement_by_business,
            statement_by_python,
        }
    }

    pub fn map(&self) -> &BusinessRuleSourceMap {
        &self.map
    }

    /// Python lines generated for a business-rule line
    pub fn business_to_python(&self, business_line: usize) -> Option<&[usize]> {
        self.business_to_python.get(&business_line).map(Vec::as_slice)
    }

    /// Business-rule line a Python line was generated from
    pub fn python_to_business(&self, python_line: usize) -> Option<usize> {
        self.python_to_business.get(&python_line).copied()
    }

    pub fn statement_for_business_line(&self, business_line: usize) -> Option<&SourceMapStatement> {
        self.statement_by_business
            .get(&business_line)
            .map(|&idx| &self.map.statements[idx])
    }

    pub fn statement_for_python_line(&self, python_line: usize) -> Option<&SourceMapStatement> {
        self.statement_by_python
            .get(&python_line)
            .map(|&idx| &self.map.statements[idx])
    }

    /// Business line of the closest mapped Python line at or before
    /// `python_line`. Unmapped lines (imports, `pass`, `try:`) resolve to
    /// the statement above them.
    pub fn nearest_business_line(&self, python_line: usize) -> Option<usize> {
        self.python_to_business
            .range(..=python_line)
            .next_back()
            .map(|(_, &business)| business)
    }

    /// Format an error at a Python line with the business-rule source
    /// around the line it maps to
    pub fn format_error_context(&self, python_line: usize, message: &str, business_source: &str) -> String {
        let mut output = String::new();

        let business_line = match self.nearest_business_line(python_line) {
            Some(line) => line,
            None => {
                output.push_str(&format!("error: {}\n  --> generated line {}\n", message, python_line));
                return output;
            }
        };

        output.push_str(&format!("error: {}\n  --> business rule line {}\n", message, business_line));

        // Two lines of context on each side
        let start = business_line.saturating_sub(2).max(1);
        let end = business_line + 2;
        for (i, line) in business_source.lines().enumerate() {
            let line_num = i + 1;
            if line_num >= start && line_num <= end {
                let marker = if line_num == business_line { ">" } else { " " };
                output.push_str(&format!("{} {:4} | {}\n", marker, line_num, line));
            }
        }

        output
    }

    /// Map every `File "...", line N` frame of a Python traceback to its
    /// business-rule line
    pub fn map_traceback(&self, traceback: &str) -> Vec<(usize, Option<usize>)> {
        parse_traceback_lines(traceback)
            .into_iter()
            .map(|python| (python, self.nearest_business_line(python)))
            .collect()
    }
}

/// Python line numbers named by the frames of a traceback
pub fn parse_traceback_lines(traceback: &str) -> Vec<usize> {
    TRACEBACK_LINE
        .captures_iter(traceback)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}
