//! JSON reporter

use std::io::{self, Write};

use serde_json::{Value, json};

use super::{CaseInfo, CaseResult, TestReporter, TestSummary};

/// Collects case results and writes one JSON document when the run completes.
///
/// ```json
/// {"cases": [{"name": "Widget > renders title", "status": "passed", "duration_ms": 1}],
///  "summary": {"total": 1, "passed": 1, "failed": 0, "skipped": 0, "duration_ms": 1}}
/// ```
pub struct JsonReporter {
    out: Box<dyn Write>,
    cases: Vec<Value>,
    document: Option<Value>,
}

impl JsonReporter {
    /// Reporter writing to stdout
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write>) -> Self {
        Self {
            out,
            cases: Vec::new(),
            document: None,
        }
    }

    /// The document written by the last completed run
    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TestReporter for JsonReporter {
    fn on_case_complete(&mut self, case: &CaseInfo, result: &CaseResult) {
        let entry = match result {
            CaseResult::Passed(d) => json!({
                "name": case.full_name(),
                "status": "passed",
                "duration_ms": d.as_millis() as u64,
            }),
            CaseResult::Failed(d, failure) => json!({
                "name": case.full_name(),
                "status": "failed",
                "duration_ms": d.as_millis() as u64,
                "message": failure.to_string(),
            }),
            CaseResult::Skipped => json!({
                "name": case.full_name(),
                "status": "skipped",
            }),
        };
        self.cases.push(entry);
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        let document = json!({
            "cases": std::mem::take(&mut self.cases),
            "summary": {
                "total": summary.total,
                "passed": summary.passed,
                "failed": summary.failed,
                "skipped": summary.skipped,
                "duration_ms": summary.duration.as_millis() as u64,
            },
        });
        if let Err(e) = serde_json::to_writer_pretty(&mut self.out, &document) {
            tracing::warn!("failed to write JSON report: {}", e);
        }
        let _ = writeln!(self.out);
        let _ = self.out.flush();
        self.document = Some(document);
    }
}
