use std::fmt;

/// Final state of a single test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    /// A required assertion did not hold, or the test panicked.
    Failed(String),
    /// The test returned an error that is not an assertion failure, or timed out.
    Errored(String),
    Skipped(SkipReason),
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Ignored,
    NotOnly,
    Filtered,
    DependencyNotPassed(String),
    FailFast,
    SuiteNotStarted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ignored => write!(f, "ignored"),
            SkipReason::NotOnly => write!(f, "another test is marked `only`"),
            SkipReason::Filtered => write!(f, "filtered out"),
            SkipReason::DependencyNotPassed(dep) => write!(f, "dependency '{dep}' did not pass"),
            SkipReason::FailFast => write!(f, "fail-fast after an earlier failure"),
            SkipReason::SuiteNotStarted => write!(f, "suite setup failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    pub suite: String,
    pub name: String,
    pub outcome: TestOutcome,
}

/// Aggregate of a whole run: what was executed and how it ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    records: Vec<TestRecord>,
    /// Suite-level problems (creation, hooks, planning) in display form.
    suite_errors: Vec<(String, String)>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, suite: &str, name: &str, outcome: TestOutcome) {
        self.records.push(TestRecord {
            suite: suite.to_string(),
            name: name.to_string(),
            outcome,
        });
    }

    pub fn record_suite_error(&mut self, suite: &str, error: impl fmt::Display) {
        self.suite_errors
            .push((suite.to_string(), format!("{error:#}")));
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn outcome_of(&self, name: &str) -> Option<&TestOutcome> {
        self.records
            .iter()
            .rev()
            .find(|record| record.name == name)
            .map(|record| &record.outcome)
    }

    /// Tests that were actually executed. Unlike unittest's `testsRun`,
    /// skipped tests are not counted; see [`Self::skipped`].
    pub fn tests_run(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !matches!(r.outcome, TestOutcome::Skipped(_)))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TestOutcome::Failed(_)))
    }

    /// Test errors plus suite-level errors.
    pub fn error_count(&self) -> usize {
        self.errors().count() + self.suite_errors.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &TestRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TestOutcome::Errored(_)))
    }

    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TestOutcome::Skipped(_)))
            .count()
    }

    pub fn was_successful(&self) -> bool {
        self.failures().next().is_none() && self.error_count() == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);
        writeln!(f, "{rule}")?;
        writeln!(f, "COMPLETE FEATURE TEST SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Tests Run: {}", self.tests_run())?;
        writeln!(f, "Failures: {}", self.failures().count())?;
        writeln!(f, "Errors: {}", self.error_count())?;
        writeln!(f, "Skipped: {}", self.skipped())?;
        writeln!(f)?;
        if self.was_successful() {
            writeln!(f, "ALL FEATURES TESTED SUCCESSFULLY")?;
        } else {
            writeln!(f, "SOME TESTS FAILED")?;
            if self.failures().next().is_some() {
                writeln!(f, "FAILURES:")?;
                for record in self.failures() {
                    writeln!(f, "  - {} :: {}", record.suite, record.name)?;
                }
            }
            if self.error_count() > 0 {
                writeln!(f, "ERRORS:")?;
                for record in self.errors() {
                    writeln!(f, "  - {} :: {}", record.suite, record.name)?;
                }
                for (suite, error) in &self.suite_errors {
                    writeln!(f, "  - {suite}: {error}")?;
                }
            }
        }
        write!(f, "{rule}")
    }
}
