use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use edu_hub_runner::{
    Reporter, RunSummary, SkipReason, TestError, TestOutcome, TestRunnerConfiguration, Tester,
    assert_required, workflow_suite,
};

/// Shared log of hook and test invocations, handed to suites as config.
#[derive(Debug, Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Reporter that keeps the event stream in memory instead of printing it.
#[derive(Debug, Clone, Default)]
struct RecordingReporter(Arc<Mutex<Vec<String>>>);

impl RecordingReporter {
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn name(&self) -> &'static str {
        "RecordingReporter"
    }

    fn on_test_suite_creation_started(&mut self, name: &str) {
        self.push(format!("creating {name}"));
    }

    fn on_test_suite_creation_finished(&mut self, name: &str, error: Option<&TestError>) {
        self.push(format!("created {name} ok={}", error.is_none()));
    }

    fn on_test_suite_ignored(&mut self, name: &str) {
        self.push(format!("suite ignored {name}"));
    }

    fn on_test_suite_start(&mut self, name: &str) {
        self.push(format!("suite start {name}"));
    }

    fn on_test_suite_end(&mut self, name: &str, error: Option<&TestError>) {
        self.push(format!("suite end {name} ok={}", error.is_none()));
    }

    fn on_test_start(&mut self, name: &str) {
        self.push(format!("start {name}"));
    }

    fn on_test_skipped(&mut self, name: &str, _reason: &SkipReason) {
        self.push(format!("skip {name}"));
    }

    fn on_test_end(&mut self, name: &str, _outcome: &TestOutcome) {
        self.push(format!("end {name}"));
    }

    fn on_run_end(&mut self, summary: &RunSummary) {
        self.push(format!("run end {}", summary.tests_run()));
    }
}

#[derive(Debug, Clone)]
struct RoleFlow {
    journal: Journal,
}

#[workflow_suite("Role flow")]
impl RoleFlow {
    #[constructor]
    async fn new(journal: &Journal) -> anyhow::Result<Self> {
        Ok(Self {
            journal: journal.clone(),
        })
    }

    #[before_all]
    async fn open_session(&self) -> anyhow::Result<()> {
        self.journal.push("before_all");
        Ok(())
    }

    #[after_all]
    async fn close_session(&self) -> anyhow::Result<()> {
        self.journal.push("after_all");
        Ok(())
    }

    #[before_each]
    async fn reset(&self) -> anyhow::Result<()> {
        self.journal.push("before_each");
        Ok(())
    }

    #[test_case("Admin workflow", depends_on = "Teacher workflow")]
    async fn admin(&self) -> anyhow::Result<()> {
        self.journal.push("admin");
        Ok(())
    }

    #[test_case("Authentication flow")]
    async fn authentication(&self) -> anyhow::Result<()> {
        self.journal.push("authentication");
        Ok(())
    }

    #[test_case("Teacher workflow", depends_on = "Authentication flow")]
    async fn teacher(&self) -> anyhow::Result<()> {
        self.journal.push("teacher");
        assert_required(false, "Upload marker missing")?;
        Ok(())
    }

    #[test_case("Student workflow", depends_on = "Authentication flow")]
    async fn student(&self) -> anyhow::Result<()> {
        self.journal.push("student");
        Err(anyhow::anyhow!("webdriver connection reset"))
    }

    #[test_case("Panicking check")]
    async fn panicking(&self) -> anyhow::Result<()> {
        panic!("Panics must be caught");
    }

    #[test_case("Not ready yet", ignore)]
    async fn ignored(&self) -> anyhow::Result<()> {
        self.journal.push("ignored");
        Ok(())
    }
}

async fn run(
    journal: &Journal,
    runner_config: TestRunnerConfiguration,
) -> (RunSummary, RecordingReporter) {
    let reporter = RecordingReporter::default();
    let mut tester = Tester::new(journal.clone())
        .with_runner_config(runner_config)
        .with_reporter(Box::new(reporter.clone()));
    tester.add_suite(RoleFlow::new());
    (tester.run().await, reporter)
}

#[tokio::test]
async fn dependencies_order_and_gate_tests() {
    let journal = Journal::default();
    let (summary, reporter) = run(&journal, TestRunnerConfiguration::default()).await;

    assert_eq!(
        journal.entries(),
        vec![
            "before_all",
            "before_each",
            "authentication",
            "before_each",
            "teacher",
            "before_each",
            "student",
            "before_each",
            "after_all",
        ]
    );

    assert_eq!(summary.outcome_of("Authentication flow"), Some(&TestOutcome::Passed));
    assert!(matches!(
        summary.outcome_of("Teacher workflow"),
        Some(TestOutcome::Failed(msg)) if msg.contains("Upload marker missing")
    ));
    assert!(matches!(
        summary.outcome_of("Student workflow"),
        Some(TestOutcome::Errored(msg)) if msg.contains("webdriver connection reset")
    ));
    assert_eq!(
        summary.outcome_of("Admin workflow"),
        Some(&TestOutcome::Skipped(SkipReason::DependencyNotPassed(
            "Teacher workflow".to_string()
        )))
    );
    assert!(matches!(
        summary.outcome_of("Panicking check"),
        Some(TestOutcome::Failed(msg)) if msg.contains("Panics must be caught")
    ));
    assert_eq!(
        summary.outcome_of("Not ready yet"),
        Some(&TestOutcome::Skipped(SkipReason::Ignored))
    );

    assert_eq!(summary.tests_run(), 4);
    assert_eq!(summary.failures().count(), 2);
    assert_eq!(summary.error_count(), 1);
    assert_eq!(summary.skipped(), 2);
    assert!(!summary.was_successful());

    let events = reporter.events();
    assert_eq!(events.first().map(String::as_str), Some("creating Role flow"));
    assert_eq!(events.last().map(String::as_str), Some("run end 4"));
    assert!(events.contains(&"skip Admin workflow".to_string()));
}

#[tokio::test]
async fn fail_fast_skips_the_rest() {
    let journal = Journal::default();
    let config = TestRunnerConfiguration::default().with_fail_fast(true);
    let (summary, _) = run(&journal, config).await;

    // Teacher fails first; student is skipped even though its dependency passed.
    assert_eq!(
        summary.outcome_of("Student workflow"),
        Some(&TestOutcome::Skipped(SkipReason::FailFast))
    );
    assert!(journal.entries().contains(&"after_all".to_string()));
}

#[tokio::test]
async fn test_filter_skips_unselected_tests() {
    let journal = Journal::default();
    let config = TestRunnerConfiguration::default()
        .with_test_case_filter(regex::Regex::new("^Authentication").unwrap());
    let (summary, _) = run(&journal, config).await;

    assert_eq!(summary.tests_run(), 1);
    assert!(summary.was_successful());
    assert_eq!(
        summary.outcome_of("Teacher workflow"),
        Some(&TestOutcome::Skipped(SkipReason::Filtered))
    );
}

#[tokio::test]
async fn suite_filter_skips_whole_suite() {
    let journal = Journal::default();
    let config = TestRunnerConfiguration::default()
        .with_test_suite_filter(regex::Regex::new("^Nothing$").unwrap());
    let (summary, reporter) = run(&journal, config).await;

    assert_eq!(summary.tests_run(), 0);
    assert!(journal.entries().is_empty());
    assert!(reporter.events().contains(&"suite ignored Role flow".to_string()));
}

#[derive(Debug, Clone)]
struct BrokenSetup {
    journal: Journal,
}

#[workflow_suite("Broken setup")]
impl BrokenSetup {
    #[constructor]
    async fn new(journal: &Journal) -> anyhow::Result<Self> {
        Ok(Self {
            journal: journal.clone(),
        })
    }

    #[constructor("unreachable webdriver")]
    async fn unreachable(_journal: &Journal) -> anyhow::Result<Self> {
        anyhow::bail!("connection refused")
    }

    #[before_all]
    async fn before_all(&self) -> anyhow::Result<()> {
        anyhow::bail!("download directory is read-only")
    }

    #[after_all]
    async fn after_all(&self) -> anyhow::Result<()> {
        self.journal.push("after_all");
        Ok(())
    }

    #[test_case("Never runs")]
    async fn never_runs(&self) -> anyhow::Result<()> {
        self.journal.push("never_runs");
        Ok(())
    }
}

#[tokio::test]
async fn setup_failures_are_reported_not_fatal() {
    let journal = Journal::default();
    let reporter = RecordingReporter::default();
    let mut tester = Tester::new(journal.clone()).with_reporter(Box::new(reporter.clone()));
    tester.add_suite(BrokenSetup::unreachable());
    tester.add_suite(BrokenSetup::new());
    let summary = tester.run().await;

    assert!(journal.entries().is_empty());
    assert_eq!(
        summary.outcome_of("Never runs"),
        Some(&TestOutcome::Skipped(SkipReason::SuiteNotStarted))
    );
    // One creation error plus one `before_all` error.
    assert_eq!(summary.error_count(), 2);
    assert!(
        reporter
            .events()
            .contains(&"created Broken setup (unreachable webdriver) ok=false".to_string())
    );
}

#[derive(Debug, Clone)]
struct SlowFlow;

#[workflow_suite("Slow flow")]
impl SlowFlow {
    #[constructor]
    async fn new(_journal: &Journal) -> anyhow::Result<Self> {
        Ok(Self)
    }

    #[test_case("Hangs")]
    async fn hangs(&self) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test]
async fn timeouts_count_as_errors() {
    let mut tester = Tester::new(Journal::default())
        .with_runner_config(
            TestRunnerConfiguration::default().with_timeout(Duration::from_millis(50)),
        )
        .with_reporter(Box::new(RecordingReporter::default()));
    tester.add_suite(SlowFlow::new());
    let summary = tester.run().await;

    assert!(matches!(
        summary.outcome_of("Hangs"),
        Some(TestOutcome::Errored(msg)) if msg.contains("timed out")
    ));
}

#[derive(Debug, Clone)]
struct SetupFlow {
    journal: Journal,
}

#[workflow_suite("Setup flow")]
impl SetupFlow {
    #[constructor]
    async fn new(journal: &Journal) -> anyhow::Result<Self> {
        Ok(Self {
            journal: journal.clone(),
        })
    }

    #[test_case("Account setup")]
    async fn account_setup(&self) -> anyhow::Result<()> {
        self.journal.push("setup");
        Ok(())
    }

    #[test_case("Teacher workflow")]
    async fn teacher(&self) -> anyhow::Result<()> {
        self.journal.push("teacher");
        assert_required(false, "Question marker missing")?;
        Ok(())
    }

    #[test_case("Admin workflow", depends_on = "Account setup")]
    async fn admin(&self) -> anyhow::Result<()> {
        self.journal.push("admin");
        Ok(())
    }
}

#[tokio::test]
async fn dependents_only_wait_for_their_own_dependency() {
    let journal = Journal::default();
    let mut tester =
        Tester::new(journal.clone()).with_reporter(Box::new(RecordingReporter::default()));
    tester.add_suite(SetupFlow::new());
    let summary = tester.run().await;

    assert_eq!(journal.entries(), vec!["setup", "teacher", "admin"]);
    assert!(matches!(
        summary.outcome_of("Teacher workflow"),
        Some(TestOutcome::Failed(_))
    ));
    assert_eq!(summary.outcome_of("Admin workflow"), Some(&TestOutcome::Passed));
    assert_eq!(summary.skipped(), 0);
}
