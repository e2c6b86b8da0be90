//! Console reporter (pytest-style)

use std::io::{self, Write};

use super::{CaseInfo, CaseResult, TestReporter, TestSummary};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Default console reporter (pytest-style)
///
/// Without `verbose` every case prints a single progress marker: `.` passed, `F` failed, `s` skipped.
pub struct ConsoleReporter {
    pub verbose: bool,
    pub color: bool,
    out: Box<dyn Write>,
    failures: Vec<(String, String)>,
}

impl ConsoleReporter {
    /// Reporter writing to stderr
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(verbose, Box::new(io::stderr()))
    }

    pub fn with_writer(verbose: bool, out: Box<dyn Write>) -> Self {
        Self {
            verbose,
            color: true,
            out,
            failures: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn status(&self, result: &CaseResult) -> String {
        match result {
            CaseResult::Passed(d) => {
                if self.verbose {
                    format!("{} ({}ms)", self.paint(GREEN, "PASSED"), d.as_millis())
                } else {
                    self.paint(GREEN, ".")
                }
            }
            CaseResult::Failed(d, _) => {
                if self.verbose {
                    format!("{} ({}ms)", self.paint(RED, "FAILED"), d.as_millis())
                } else {
                    self.paint(RED, "F")
                }
            }
            CaseResult::Skipped => {
                if self.verbose {
                    self.paint(YELLOW, "SKIPPED")
                } else {
                    self.paint(YELLOW, "s")
                }
            }
        }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_group_start(&mut self, name: &str, depth: usize) {
        if self.verbose {
            let line = self.paint(BOLD, name);
            let _ = writeln!(self.out, "{}{}", "  ".repeat(depth), line);
        }
    }

    fn on_case_complete(&mut self, case: &CaseInfo, result: &CaseResult) {
        let status = self.status(result);
        if self.verbose {
            let _ = writeln!(self.out, "{}{} ... {}", "  ".repeat(case.groups.len()), case.label, status);
        } else {
            let _ = write!(self.out, "{}", status);
        }

        if let CaseResult::Failed(_, failure) = result {
            self.failures.push((case.full_name(), failure.to_string()));
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        if !self.verbose && summary.total > 0 {
            let _ = writeln!(self.out);
        }

        if !self.failures.is_empty() {
            let header = self.paint(RED, "=================== FAILURES ===================");
            let _ = writeln!(self.out);
            let _ = writeln!(self.out, "{}", header);
            for (name, message) in std::mem::take(&mut self.failures) {
                let _ = writeln!(self.out, "___________ {} ___________", name);
                let _ = writeln!(self.out);
                for line in message.lines() {
                    let _ = writeln!(self.out, "    {}", line);
                }
                let _ = writeln!(self.out);
            }
        }

        let summary_color = if summary.success() { GREEN } else { RED };
        let line = format!(
            "====== {} in {:.2}s ======",
            summary.counts_line(),
            summary.duration.as_secs_f64()
        );
        let line = self.paint(summary_color, &line);
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}
