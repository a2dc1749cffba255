use std::{any::Any, collections::HashMap, panic::AssertUnwindSafe, time::Duration};

use futures::FutureExt as _;

pub use self::{
    assertions::{AssertionFailure, assert_optional, assert_required, soft_step},
    config::TestRunnerConfiguration,
    reporter::{Reporter, console::ConsoleReporter},
    summary::{RunSummary, SkipReason, TestOutcome, TestRecord},
    traits::{Test, TestSuite, TestSuiteFactory},
};
/// Procedural macro for defining workflow suites.
pub use edu_hub_runner_macro::workflow_suite;

mod assertions;
mod config;
mod plan;
mod reporter;
mod summary;
mod traits;

/// Installs the `tracing` subscriber used by suite binaries.
///
/// Honors `RUST_LOG`, defaults to `info`. Calling it more than once is harmless.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[derive(Debug)]
pub struct Tester<C: std::fmt::Debug + 'static> {
    /// Configuration handed to every suite constructor.
    config: C,
    /// Filters, timeouts and fail-fast behavior.
    runner_config: TestRunnerConfiguration,
    /// List of test suites to run.
    test_suites: Vec<Box<dyn TestSuiteFactory<C>>>,
    /// Reporter for test events.
    reporter: Box<dyn Reporter>,
}

impl<C: std::fmt::Debug + 'static> Tester<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            runner_config: TestRunnerConfiguration::default(),
            test_suites: Vec::new(),
            reporter: Box::new(ConsoleReporter::new()),
        }
    }

    pub fn with_runner_config(mut self, runner_config: TestRunnerConfiguration) -> Self {
        self.runner_config = runner_config;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn add_suite(&mut self, factory: Box<dyn TestSuiteFactory<C>>) {
        self.test_suites.push(factory);
    }

    /// Runs every suite in the order they were added and returns the summary.
    ///
    /// Suite-level problems do not stop the run; they are recorded in the
    /// summary and the next suite is started.
    pub async fn run(self) -> RunSummary {
        let Tester {
            config,
            runner_config,
            test_suites,
            mut reporter,
        } = self;
        let mut summary = RunSummary::new();
        let mut fail_fast_tripped = false;

        for factory in &test_suites {
            let name = factory.name();
            if !runner_config.selects_suite(&name) {
                reporter.on_test_suite_ignored(&name);
                continue;
            }

            reporter.on_test_suite_creation_started(&name);
            let suite_result = factory
                .create_suite(&config)
                .await
                .map_err(TestError::CreateSuite);
            reporter.on_test_suite_creation_finished(&name, suite_result.as_ref().err());
            let suite = match suite_result {
                Ok(suite) => suite,
                Err(err) => {
                    summary.record_suite_error(&name, &err);
                    continue; // Skip this suite if creation failed
                }
            };

            reporter.on_test_suite_start(&name);
            let mut run = SuiteRun {
                suite_name: &name,
                runner_config: &runner_config,
                reporter: reporter.as_mut(),
                summary: &mut summary,
                fail_fast_tripped: &mut fail_fast_tripped,
            };
            let suite_run_result = run.run(suite.as_ref()).await;
            reporter.on_test_suite_end(&name, suite_run_result.as_ref().err());
            if let Err(err) = suite_run_result {
                summary.record_suite_error(&name, &err);
            }
        }

        reporter.on_run_end(&summary);
        summary
    }
}

struct SuiteRun<'a> {
    suite_name: &'a str,
    runner_config: &'a TestRunnerConfiguration,
    reporter: &'a mut dyn Reporter,
    summary: &'a mut RunSummary,
    fail_fast_tripped: &'a mut bool,
}

impl SuiteRun<'_> {
    async fn run(&mut self, suite: &dyn TestSuite) -> Result<(), TestError> {
        let tests = suite.tests();
        let graph: Vec<_> = tests.iter().map(|t| (t.name(), t.depends_on())).collect();
        let order = plan::execution_order(&graph)?;

        if let Err(err) = suite.before_all().await {
            for test in &tests {
                self.skip(&test.name(), SkipReason::SuiteNotStarted);
            }
            return Err(TestError::BeforeAll(err));
        }

        // Check if at least one test has `only` set to true.
        let has_only = tests.iter().any(|test| test.only());
        let mut passed: HashMap<String, bool> = HashMap::new();

        for idx in order {
            let test = &tests[idx];
            let name = test.name();
            if let Some(reason) = self.skip_reason(test.as_ref(), has_only, &passed) {
                self.skip(&name, reason);
                passed.insert(name, false);
                continue;
            }

            self.reporter.on_test_start(&name);
            let mut outcome = match suite.before_each().await {
                Ok(()) => self.run_test(test.as_ref()).await,
                Err(err) => TestOutcome::Errored(TestError::BeforeEach(err).to_string()),
            };
            if let Err(err) = suite.after_each().await {
                let err = TestError::AfterEach(err);
                tracing::error!("{err}");
                if outcome.is_passed() {
                    outcome = TestOutcome::Errored(err.to_string());
                }
            }

            self.reporter.on_test_end(&name, &outcome);
            if !outcome.is_passed() && self.runner_config.fail_fast() {
                *self.fail_fast_tripped = true;
            }
            passed.insert(name.clone(), outcome.is_passed());
            self.summary.record(self.suite_name, &name, outcome);
        }

        suite.after_all().await.map_err(TestError::AfterAll)?;

        Ok(())
    }

    fn skip_reason(
        &self,
        test: &dyn Test,
        has_only: bool,
        passed: &HashMap<String, bool>,
    ) -> Option<SkipReason> {
        if test.ignore() && !self.runner_config.run_ignored() {
            return Some(SkipReason::Ignored);
        }
        if has_only && !test.only() {
            return Some(SkipReason::NotOnly);
        }
        if !self.runner_config.selects_test(&test.name()) {
            return Some(SkipReason::Filtered);
        }
        if *self.fail_fast_tripped {
            return Some(SkipReason::FailFast);
        }
        test.depends_on()
            .into_iter()
            .find(|dep| !passed.get(dep).copied().unwrap_or(false))
            .map(SkipReason::DependencyNotPassed)
    }

    fn skip(&mut self, name: &str, reason: SkipReason) {
        self.reporter.on_test_skipped(name, &reason);
        self.summary
            .record(self.suite_name, name, TestOutcome::Skipped(reason));
    }

    async fn run_test(&self, test: &dyn Test) -> TestOutcome {
        let name = test.name();
        let timeout = self.runner_config.timeout();
        let guarded = AssertUnwindSafe(test.run()).catch_unwind();
        match tokio::time::timeout(timeout, guarded).await {
            Err(_elapsed) => TestOutcome::Errored(TestError::Timeout(name, timeout).to_string()),
            Ok(Err(payload)) => {
                TestOutcome::Failed(TestError::Panic(name, panic_message(payload)).to_string())
            }
            Ok(Ok(Err(err))) => {
                if assertions::is_assertion_failure(&err) {
                    TestOutcome::Failed(format!("{err:#}"))
                } else {
                    TestOutcome::Errored(TestError::Test(name, err).to_string())
                }
            }
            Ok(Ok(Ok(()))) => TestOutcome::Passed,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Failed to create test suite: {0:?}")]
    CreateSuite(anyhow::Error),
    #[error("Failed to run 'before_all' for the test suite: {0:?}")]
    BeforeAll(anyhow::Error),
    #[error("Failed to run 'before_each' the test suite: {0:?}")]
    BeforeEach(anyhow::Error),
    #[error("Failed to run 'after_each' the test suite: {0:?}")]
    AfterEach(anyhow::Error),
    #[error("Failed to run 'after_all' the test suite: {0:?}")]
    AfterAll(anyhow::Error),
    #[error("Test {0} failed: {1:?}")]
    Test(String, anyhow::Error),
    #[error("Test {0} timed out after {1:?}")]
    Timeout(String, Duration),
    #[error("Test {0} panicked: {1}")]
    Panic(String, String),
    #[error("Test {test} depends on unknown test {dependency}")]
    UnknownDependency { test: String, dependency: String },
    #[error("Tests {0:?} depend on each other")]
    DependencyCycle(Vec<String>),
}

/// Re-exports for procedural macros.
#[doc(hidden)]
pub mod __private_reexports {
    pub use async_trait::async_trait;
}
