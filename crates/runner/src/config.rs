use std::time::Duration;

#[derive(Debug, Default, Clone, clap::Args)]
pub struct TestRunnerConfiguration {
    /// Regex filter for test suites.
    #[clap(long, env = "EDU_HUB_SUITE_FILTER")]
    pub(crate) test_suite_filter: Option<regex::Regex>,
    /// Regex filter for test cases. Dependencies of a selected case are not
    /// pulled in automatically, so filtering one out skips its dependents.
    #[clap(long, env = "EDU_HUB_TEST_FILTER")]
    pub(crate) test_case_filter: Option<regex::Regex>,
    /// Whether to run ignored tests.
    #[clap(long, default_value = "false")]
    pub(crate) run_ignored: bool,
    /// Timeout for each test case.
    #[clap(long, env = "EDU_HUB_TEST_TIMEOUT_MS")]
    pub(crate) timeout_ms: Option<u64>,
    /// Stop after the first failed test.
    #[clap(long)]
    pub(crate) fail_fast: bool,
}

impl TestRunnerConfiguration {
    const DEFAULT_TIMEOUT_MS: u64 = 60_000; // 60 seconds

    pub fn with_test_suite_filter(mut self, filter: regex::Regex) -> Self {
        self.test_suite_filter = Some(filter);
        self
    }

    pub fn with_test_case_filter(mut self, filter: regex::Regex) -> Self {
        self.test_case_filter = Some(filter);
        self
    }

    pub fn with_run_ignored(mut self, run_ignored: bool) -> Self {
        self.run_ignored = run_ignored;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Sets the timeout only if none was given explicitly.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms.get_or_insert(timeout.as_millis() as u64);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(Self::DEFAULT_TIMEOUT_MS))
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn run_ignored(&self) -> bool {
        self.run_ignored
    }

    pub(crate) fn selects_suite(&self, name: &str) -> bool {
        self.test_suite_filter
            .as_ref()
            .is_none_or(|filter| filter.is_match(name))
    }

    pub(crate) fn selects_test(&self, name: &str) -> bool {
        self.test_case_filter
            .as_ref()
            .is_none_or(|filter| filter.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_default_to_everything() {
        let config = TestRunnerConfiguration::default();
        assert!(config.selects_suite("Education Hub"));
        assert!(config.selects_test("Student workflow"));
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_filter_is_a_regex() {
        let config = TestRunnerConfiguration::default()
            .with_test_case_filter(regex::Regex::new("^(Student|Teacher)").unwrap());
        assert!(config.selects_test("Student workflow"));
        assert!(config.selects_test("Teacher workflow"));
        assert!(!config.selects_test("Authentication flow"));
    }

    #[test]
    fn explicit_timeout_wins_over_default() {
        let config = TestRunnerConfiguration::default()
            .with_timeout(Duration::from_secs(5))
            .with_default_timeout(Duration::from_secs(600));
        assert_eq!(config.timeout(), Duration::from_secs(5));

        let config =
            TestRunnerConfiguration::default().with_default_timeout(Duration::from_secs(600));
        assert_eq!(config.timeout(), Duration::from_secs(600));
    }
}
