//! Reporting for harness runs
//!
//! The harness emits events to a [`TestReporter`]; output format is entirely the reporter's business.
//!
//! - `console` - pytest-style terminal output
//! - `json` - a single JSON document written at the end of the run

pub mod console;
pub mod json;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

use std::time::Duration;

use crate::error::CaseFailure;

/// Trait for reporting case execution results.
///
/// Implement this trait to customize test output format (JSON, TAP, etc.)
pub trait TestReporter {
    /// Called when the harness enters a group that has at least one selected case
    fn on_group_start(&mut self, _name: &str, _depth: usize) {}

    /// Called before a case's setup hooks run
    fn on_case_start(&mut self, _case: &CaseInfo) {}

    /// Called when a case completes (or is skipped)
    fn on_case_complete(&mut self, case: &CaseInfo, result: &CaseResult);

    /// Called when all cases have completed
    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// Identity of a registered case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseInfo {
    /// Names of the enclosing groups, outermost first
    pub groups: Vec<String>,
    pub label: String,
}

impl CaseInfo {
    /// `Group > Nested > label`
    pub fn full_name(&self) -> String {
        let mut parts: Vec<&str> = self.groups.iter().map(String::as_str).collect();
        parts.push(&self.label);
        parts.join(" > ")
    }
}

/// Result of running a single case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseResult {
    Passed(Duration),
    Failed(Duration, CaseFailure),
    Skipped,
}

impl CaseResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, CaseResult::Failed(..))
    }
}

/// Summary of a harness run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: Duration,
}

impl TestSummary {
    pub fn record(&mut self, result: &CaseResult) {
        self.total += 1;
        match result {
            CaseResult::Passed(_) => self.passed += 1,
            CaseResult::Failed(..) => self.failed += 1,
            CaseResult::Skipped => self.skipped += 1,
        }
    }

    /// True when no case failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// `2 passed, 1 skipped`, or `no cases ran` for an empty run
    pub fn counts_line(&self) -> String {
        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if parts.is_empty() {
            "no cases ran".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Everything a harness run produced, in execution order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<(CaseInfo, CaseResult)>,
    pub summary: TestSummary,
}

impl RunReport {
    /// Result of the case with this full name, if it was reported
    pub fn result_of(&self, full_name: &str) -> Option<&CaseResult> {
        self.results
            .iter()
            .find(|(info, _)| info.full_name() == full_name)
            .map(|(_, result)| result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_joins_groups() {
        let info = CaseInfo {
            groups: vec!["Widget".to_string(), "title".to_string()],
            label: "renders".to_string(),
        };
        assert_eq!(info.full_name(), "Widget > title > renders");
    }

    #[test]
    fn test_full_name_top_level() {
        let info = CaseInfo {
            groups: Vec::new(),
            label: "alone".to_string(),
        };
        assert_eq!(info.full_name(), "alone");
    }

    #[test]
    fn test_summary_record_and_counts_line() {
        let mut summary = TestSummary::default();
        summary.record(&CaseResult::Passed(Duration::ZERO));
        summary.record(&CaseResult::Passed(Duration::ZERO));
        summary.record(&CaseResult::Skipped);
        assert_eq!(summary.total, 3);
        assert!(summary.success());
        assert_eq!(summary.counts_line(), "2 passed, 1 skipped");

        summary.record(&CaseResult::Failed(Duration::ZERO, CaseFailure::Panicked("x".to_string())));
        assert!(!summary.success());
        assert_eq!(summary.counts_line(), "2 passed, 1 failed, 1 skipped");
    }

    #[test]
    fn test_counts_line_empty_run() {
        assert_eq!(TestSummary::default().counts_line(), "no cases ran");
    }
}
