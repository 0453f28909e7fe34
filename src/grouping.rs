//! Statement Grouping
//!
//! Folds physical lines into logical statements using the continuation
//! decisions of [`LineContinuationDetector`]:
//!
//! - a blank line always ends the current statement and is dropped
//! - a line whose result says "continue" pulls the next line into its group
//! - a group is incomplete when one of its lines continued because of
//!   `incomplete-function-call` or `incomplete-if-statement`
//!
//! Groups are created fresh on every call and never mutated afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::continuation::{
    ContinuationDetectionResult, LineContinuationDetector, LineInfo, INCOMPLETE_FUNCTION_CALL,
    INCOMPLETE_IF_STATEMENT,
};

/// A logical statement made of one or more physical lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementGroup {
    /// 1-based position of the group in the source
    pub id: usize,
    pub lines: Vec<LineInfo>,
    pub start_line: usize,
    pub end_line: usize,
    pub is_complete: bool,
    /// Reasons of every line that continued into the next
    pub continuation_reasons: Vec<String>,
}

impl StatementGroup {
    fn open(id: usize, first: LineInfo) -> Self {
        StatementGroup {
            id,
            start_line: first.line_number,
            end_line: first.line_number,
            lines: vec![first],
            is_complete: true,
            continuation_reasons: Vec::new(),
        }
    }

    fn push(&mut self, line: LineInfo) {
        self.end_line = line.line_number;
        self.lines.push(line);
    }

    fn seal(mut self) -> Self {
        self.is_complete = !self
            .continuation_reasons
            .iter()
            .any(|r| r == INCOMPLETE_FUNCTION_CALL || r == INCOMPLETE_IF_STATEMENT);
        self
    }

    /// Indentation of the first line
    pub fn indent(&self) -> usize {
        self.lines.first().map_or(0, |l| l.indent_level)
    }

    /// Code of all lines joined with single spaces
    pub fn joined_code(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.code.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Trimmed source of all lines joined with single spaces
    pub fn joined_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trimmed.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// Diagnostics over a grouping pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingStatistics {
    pub total_statements: usize,
    pub complete_statements: usize,
    pub incomplete_statements: usize,
    /// Non-empty lines across all groups
    pub total_lines: usize,
    pub average_group_size: f64,
    pub longest_group: usize,
    pub most_common_reason: Option<String>,
}

/// Groups lines into statements
#[derive(Debug, Clone, Default)]
pub struct StatementGrouper {
    detector: LineContinuationDetector,
}

impl StatementGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector(detector: LineContinuationDetector) -> Self {
        StatementGrouper { detector }
    }

    pub fn detector(&self) -> &LineContinuationDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut LineContinuationDetector {
        &mut self.detector
    }

    pub fn group_statements(&self, text: &str) -> Vec<StatementGroup> {
        let lines = self.detector.parse_lines(text);
        let results = self.detector.analyze_lines(&lines);
        group_lines(lines, &results)
    }

    pub fn get_complete_statements(&self, text: &str) -> Vec<StatementGroup> {
        self.group_statements(text)
            .into_iter()
            .filter(|g| g.is_complete)
            .collect()
    }

    pub fn get_incomplete_statements(&self, text: &str) -> Vec<StatementGroup> {
        self.group_statements(text)
            .into_iter()
            .filter(|g| !g.is_complete)
            .collect()
    }

    /// First group whose line range contains `line`
    pub fn find_statement_containing_line(&self, text: &str, line: usize) -> Option<StatementGroup> {
        self.group_statements(text)
            .into_iter()
            .find(|g| g.contains_line(line))
    }

    pub fn get_grouping_statistics(&self, text: &str) -> GroupingStatistics {
        statistics(&self.group_statements(text))
    }
}

/// Fold lines and their continuation results into groups
pub fn group_lines(lines: Vec<LineInfo>, results: &[ContinuationDetectionResult]) -> Vec<StatementGroup> {
    let mut groups = Vec::new();
    let mut current: Option<StatementGroup> = None;
    // Result of the last line appended to `current`
    let mut last_continues = false;

    for (line, result) in lines.into_iter().zip(results.iter()) {
        if line.is_empty {
            if let Some(group) = current.take() {
                groups.push(group.seal());
            }
            last_continues = false;
            continue;
        }

        if last_continues && current.is_some() {
            if let Some(group) = current.as_mut() {
                group.push(line);
            }
        } else {
            if let Some(group) = current.take() {
                groups.push(group.seal());
            }
            current = Some(StatementGroup::open(groups.len() + 1, line));
        }

        last_continues = result.should_continue;
        if result.should_continue {
            if let Some(group) = current.as_mut() {
                group.continuation_reasons.push(result.reason.clone());
            }
        }
    }

    if let Some(group) = current.take() {
        groups.push(group.seal());
    }

    for group in &groups {
        log::debug!(
            "statement {} spans lines {}-{} (complete: {})",
            group.id,
            group.start_line,
            group.end_line,
            group.is_complete
        );
    }

    groups
}

/// Compute grouping diagnostics
pub fn statistics(groups: &[StatementGroup]) -> GroupingStatistics {
    let total_statements = groups.len();
    let complete_statements = groups.iter().filter(|g| g.is_complete).count();
    let total_lines: usize = groups.iter().map(|g| g.line_count()).sum();
    let longest_group = groups.iter().map(|g| g.line_count()).max().unwrap_or(0);
    let average_group_size = if total_statements == 0 {
        0.0
    } else {
        total_lines as f64 / total_statements as f64
    };

    // Ties go to the reason seen first.
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0usize;
    for reason in groups.iter().flat_map(|g| g.continuation_reasons.iter()) {
        let entry = counts.entry(reason.as_str()).or_insert_with(|| {
            order += 1;
            (0, order)
        });
        entry.0 += 1;
    }
    let most_common_reason = counts
        .into_iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(reason, _)| reason.to_string());

    GroupingStatistics {
        total_statements,
        complete_statements,
        incomplete_statements: total_statements - complete_statements,
        total_lines,
        average_group_size,
        longest_group,
        most_common_reason,
    }
}
