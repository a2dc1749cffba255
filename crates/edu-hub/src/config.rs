use std::{fmt, path::PathBuf, time::Duration};

use url::Url;

/// Roles known to the Education Hub application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

const REDACTED: &str = "<redacted>";

/// A `(role, email, password)` triple.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub role: Role,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("role", &self.role)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Everything environment-specific about a run.
#[derive(Clone, clap::Args)]
pub struct HubConfig {
    /// Base URL the application is served under.
    #[clap(
        long,
        env = "EDU_HUB_BASE_URL",
        default_value = "http://localhost/education_hub%20-%20Copy"
    )]
    pub base_url: Url,
    /// WebDriver endpoint (chromedriver by default).
    #[clap(long, env = "EDU_HUB_WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,
    /// Run Chrome without a window.
    #[clap(long, env = "EDU_HUB_HEADLESS")]
    pub headless: bool,

    #[clap(long, env = "EDU_HUB_ADMIN_EMAIL", default_value = "admin@gmail.com")]
    pub admin_email: String,
    #[clap(long, env = "EDU_HUB_ADMIN_PASSWORD", default_value = "123456")]
    pub admin_password: String,
    #[clap(long, env = "EDU_HUB_TEACHER_EMAIL", default_value = "teacher@gmail.com")]
    pub teacher_email: String,
    #[clap(long, env = "EDU_HUB_TEACHER_PASSWORD", default_value = "123456")]
    pub teacher_password: String,
    #[clap(long, env = "EDU_HUB_STUDENT_EMAIL", default_value = "mayur@gmail.com")]
    pub student_email: String,
    #[clap(long, env = "EDU_HUB_STUDENT_PASSWORD", default_value = "123456")]
    pub student_password: String,

    /// Directory for upload fixtures and browser downloads. Removed at the end of the run.
    #[clap(long, env = "EDU_HUB_DOWNLOAD_DIR", default_value = "test_downloads")]
    pub download_dir: PathBuf,
    /// Where the login diagnostic screenshot is written.
    #[clap(long, env = "EDU_HUB_LOGIN_SCREENSHOT", default_value = "login_error.png")]
    pub login_screenshot: PathBuf,

    /// Default bound for element and page-ready waits.
    #[clap(long, env = "EDU_HUB_WAIT_TIMEOUT_SECS", default_value = "15")]
    pub wait_timeout_secs: u64,
    /// Bound for the login form's email field to appear.
    #[clap(long, env = "EDU_HUB_LOGIN_TIMEOUT_SECS", default_value = "20")]
    pub login_timeout_secs: u64,
    /// How long an action may take to trigger a navigation before it is
    /// considered an in-page action.
    #[clap(long, env = "EDU_HUB_SETTLE_TIMEOUT_MS", default_value = "5000")]
    pub settle_timeout_ms: u64,
    /// Polling interval for all waits.
    #[clap(long, env = "EDU_HUB_POLL_INTERVAL_MS", default_value = "250")]
    pub poll_interval_ms: u64,

    #[clap(long, env = "EDU_HUB_TEACHER_LOGIN_ATTEMPTS", default_value = "3")]
    pub teacher_login_attempts: u32,
    #[clap(long, env = "EDU_HUB_TEACHER_LOGIN_BACKOFF_MS", default_value = "2000")]
    pub teacher_login_backoff_ms: u64,
}

impl fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubConfig")
            .field("base_url", &self.base_url.as_str())
            .field("webdriver_url", &self.webdriver_url)
            .field("headless", &self.headless)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &REDACTED)
            .field("teacher_email", &self.teacher_email)
            .field("teacher_password", &REDACTED)
            .field("student_email", &self.student_email)
            .field("student_password", &REDACTED)
            .field("download_dir", &self.download_dir)
            .field("login_screenshot", &self.login_screenshot)
            .field("wait_timeout_secs", &self.wait_timeout_secs)
            .field("login_timeout_secs", &self.login_timeout_secs)
            .field("settle_timeout_ms", &self.settle_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("teacher_login_attempts", &self.teacher_login_attempts)
            .field("teacher_login_backoff_ms", &self.teacher_login_backoff_ms)
            .finish()
    }
}

impl HubConfig {
    pub fn credentials(&self, role: Role) -> Credentials {
        let (email, password) = match role {
            Role::Admin => (&self.admin_email, &self.admin_password),
            Role::Teacher => (&self.teacher_email, &self.teacher_password),
            Role::Student => (&self.student_email, &self.student_password),
        };
        Credentials {
            role,
            email: email.clone(),
            password: password.clone(),
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn teacher_login_backoff(&self) -> Duration {
        Duration::from_millis(self.teacher_login_backoff_ms)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        hub: HubConfig,
    }

    pub(crate) fn parse(args: &[&str]) -> HubConfig {
        let argv = std::iter::once("edu-hub-e2e").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().hub
    }

    #[test]
    fn defaults_match_the_demo_installation() {
        let config = parse(&[]);
        assert_eq!(
            config.base_url.as_str(),
            "http://localhost/education_hub%20-%20Copy"
        );
        assert_eq!(config.wait_timeout(), Duration::from_secs(15));
        assert_eq!(config.login_timeout(), Duration::from_secs(20));
        assert_eq!(config.teacher_login_attempts, 3);
        assert_eq!(config.teacher_login_backoff(), Duration::from_secs(2));
        assert_eq!(config.download_dir, PathBuf::from("test_downloads"));

        let student = config.credentials(Role::Student);
        assert_eq!(student.email, "mayur@gmail.com");
        assert_eq!(student.password, "123456");
        assert_eq!(config.credentials(Role::Admin).email, "admin@gmail.com");
        assert_eq!(config.credentials(Role::Teacher).email, "teacher@gmail.com");
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--base-url",
            "http://hub.test/app",
            "--teacher-email",
            "t@hub.test",
            "--headless",
        ]);
        assert_eq!(config.base_url.as_str(), "http://hub.test/app");
        assert!(config.headless);
        assert_eq!(config.credentials(Role::Teacher).email, "t@hub.test");
    }

    #[test]
    fn passwords_are_not_printed() {
        let rendered = format!("{:?}", parse(&[]).credentials(Role::Admin));
        assert!(rendered.contains("admin@gmail.com"));
        assert!(!rendered.contains("123456"));
    }

    #[test]
    fn config_debug_hides_every_password() {
        let config = parse(&[
            "--admin-password",
            "admin-secret",
            "--teacher-password",
            "teacher-secret",
            "--student-password",
            "student-secret",
        ]);
        let rendered = format!("{config:?}");
        assert!(rendered.contains("teacher@gmail.com"));
        for secret in ["admin-secret", "teacher-secret", "student-secret"] {
            assert!(!rendered.contains(secret), "{secret} leaked: {rendered}");
        }
    }
}
