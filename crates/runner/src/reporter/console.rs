use console::{Term, style};

use crate::{
    RunSummary, TestError,
    reporter::Reporter,
    summary::{SkipReason, TestOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestStateMarker {
    Running,
    Skipped,
    Failed,
    Errored,
    Success,
}

impl TestStateMarker {
    pub fn emoji(&self) -> &'static str {
        match self {
            TestStateMarker::Running => "▶️",
            TestStateMarker::Skipped => "⏭️",
            TestStateMarker::Failed => "❌",
            TestStateMarker::Errored => "💥",
            TestStateMarker::Success => "✅",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestSuiteStateMarker {
    Creating,
    Running,
    Ignored,
    Error,
    Success,
}

impl TestSuiteStateMarker {
    pub fn emoji(&self) -> &'static str {
        match self {
            TestSuiteStateMarker::Creating => "🔧",
            TestSuiteStateMarker::Running => "▶️",
            TestSuiteStateMarker::Ignored => "⏭️",
            TestSuiteStateMarker::Error => "❌",
            TestSuiteStateMarker::Success => "✅",
        }
    }
}

/// Prints one line per runner event.
///
/// Lines are appended rather than redrawn: workflow tests log through
/// `tracing` while they run, and redrawing would erase those lines.
#[derive(Debug)]
pub struct ConsoleReporter {
    term: Term,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        ConsoleReporter {
            term: Term::stdout(),
        }
    }

    fn line(&self, line: String) {
        // Losing a progress line is not worth aborting the run over.
        let _ = self.term.write_line(&line);
    }

    fn suite_line(&self, marker: TestSuiteStateMarker, name: &str) {
        self.line(format!(
            "{} Test Suite: {}",
            marker.emoji(),
            style(name).bold()
        ));
    }

    fn detail(&self, text: &str) {
        for line in text.lines() {
            self.line(format!("    | {}", style(line).dim()));
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        ConsoleReporter::new()
    }
}

impl Reporter for ConsoleReporter {
    fn name(&self) -> &'static str {
        "ConsoleReporter"
    }

    fn on_test_suite_creation_started(&mut self, name: &str) {
        self.suite_line(TestSuiteStateMarker::Creating, name);
    }

    fn on_test_suite_creation_finished(&mut self, name: &str, error: Option<&TestError>) {
        if let Some(err) = error {
            self.suite_line(TestSuiteStateMarker::Error, name);
            self.detail(&err.to_string());
        }
    }

    fn on_test_suite_ignored(&mut self, name: &str) {
        self.suite_line(TestSuiteStateMarker::Ignored, name);
    }

    fn on_test_suite_start(&mut self, name: &str) {
        self.suite_line(TestSuiteStateMarker::Running, name);
    }

    fn on_test_suite_end(&mut self, name: &str, error: Option<&TestError>) {
        match error {
            Some(err) => {
                self.suite_line(TestSuiteStateMarker::Error, name);
                self.detail(&err.to_string());
            }
            None => self.suite_line(TestSuiteStateMarker::Success, name),
        }
    }

    fn on_test_start(&mut self, name: &str) {
        let rule = "=".repeat(60);
        self.line(rule.clone());
        self.line(format!(
            "  - {} {}",
            TestStateMarker::Running.emoji(),
            style(name.to_uppercase()).cyan()
        ));
        self.line(rule);
    }

    fn on_test_skipped(&mut self, name: &str, reason: &SkipReason) {
        self.line(format!(
            "  - {} {} ({})",
            TestStateMarker::Skipped.emoji(),
            name,
            style(reason).yellow()
        ));
    }

    fn on_test_end(&mut self, name: &str, outcome: &TestOutcome) {
        match outcome {
            TestOutcome::Passed => self.line(format!(
                "  - {} {}",
                TestStateMarker::Success.emoji(),
                style(name).green()
            )),
            TestOutcome::Failed(message) => {
                self.line(format!(
                    "  - {} {} failed:",
                    TestStateMarker::Failed.emoji(),
                    style(name).red()
                ));
                self.detail(message);
            }
            TestOutcome::Errored(message) => {
                self.line(format!(
                    "  - {} {} error:",
                    TestStateMarker::Errored.emoji(),
                    style(name).red()
                ));
                self.detail(message);
            }
            TestOutcome::Skipped(reason) => self.on_test_skipped(name, reason),
        }
    }

    fn on_run_end(&mut self, summary: &RunSummary) {
        self.line(String::new());
        let rendered = summary.to_string();
        let styled = if summary.was_successful() {
            style(rendered).green()
        } else {
            style(rendered).red()
        };
        self.line(styled.to_string());
    }
}
