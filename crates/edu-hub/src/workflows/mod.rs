//! The Education Hub workflow suite.
//!
//! One browser session is shared by all cases. Each case starts with a
//! defensive logout and ends logged out, so the next case starts clean.

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use edu_hub_runner::{assert_required, workflow_suite};
use tracing::{debug, info};
use url::Url;

use crate::{
    access::{AccessVerdict, RestrictionPolicy},
    auth::Auth,
    config::{Credentials, HubConfig, Role},
    fixtures::Fixtures,
    pages::Page,
    session::{BrowserSession, Selector},
};

mod admin;
mod authentication;
mod student;
mod teacher;

const SUBMIT_BUTTON: Selector<'static> = Selector::XPath("//button[@type='submit']");

#[derive(Debug, Clone)]
pub struct EducationHub {
    config: Arc<HubConfig>,
    session: Arc<BrowserSession>,
    auth: Auth,
    fixtures: Arc<Fixtures>,
}

#[workflow_suite("Education Hub")]
impl EducationHub {
    #[constructor]
    async fn new(config: &HubConfig) -> anyhow::Result<Self> {
        let fixtures = Fixtures::new(&config.download_dir)?;
        let session = match BrowserSession::connect(config, fixtures.dir()).await {
            Ok(session) => Arc::new(session),
            Err(err) => {
                fixtures.cleanup();
                return Err(err.into());
            }
        };
        info!("Browser session ready, fixtures in {}", fixtures.dir().display());

        Ok(Self {
            config: Arc::new(config.clone()),
            auth: Auth::new(session.clone(), config),
            session,
            fixtures: Arc::new(fixtures),
        })
    }

    /// Fixture files, then the fixture directory, then the browser.
    #[after_all]
    async fn teardown(&self) -> anyhow::Result<()> {
        self.fixtures.cleanup();
        self.session.quit().await;
        Ok(())
    }

    #[test_case("Authentication flow")]
    async fn authentication_flow(&self) -> anyhow::Result<()> {
        authentication::run(self).await
    }

    #[test_case("Student workflow")]
    async fn student_workflow(&self) -> anyhow::Result<()> {
        student::run(self).await
    }

    #[test_case("Teacher account setup")]
    async fn teacher_account_setup(&self) -> anyhow::Result<()> {
        teacher::setup(self).await
    }

    /// Independent of the setup case; a missing approval shows up as a
    /// failed login.
    #[test_case("Teacher workflow")]
    async fn teacher_workflow(&self) -> anyhow::Result<()> {
        teacher::run(self).await
    }

    #[test_case("Admin end-to-end workflow", depends_on = "Teacher account setup")]
    async fn admin_end_to_end_workflow(&self) -> anyhow::Result<()> {
        admin::run(self).await
    }
}

impl EducationHub {
    fn credentials(&self, role: Role) -> Credentials {
        self.config.credentials(role)
    }

    async fn open(&self, page: Page) -> anyhow::Result<Url> {
        Ok(self.session.open(page).await?)
    }

    async fn source(&self) -> anyhow::Result<String> {
        Ok(self.session.source().await?)
    }

    async fn title(&self) -> anyhow::Result<String> {
        Ok(self.session.title().await?)
    }

    /// Requests `page` and judges where the browser ended up.
    async fn probe(&self, page: Page) -> anyhow::Result<(Url, AccessVerdict)> {
        let landed = self.open(page).await?;
        let source = self.source().await?;
        let verdict = AccessVerdict::judge(self.session.site(), page, &landed, &source);
        debug!("{} -> {verdict:?}", page.file_name());
        Ok((landed, verdict))
    }

    /// Requests `page` and requires the application to keep the current
    /// role out of it.
    async fn expect_restricted(
        &self,
        role: Role,
        page: Page,
        policy: RestrictionPolicy,
    ) -> anyhow::Result<()> {
        let (landed, verdict) = self.probe(page).await?;
        assert_required(
            policy.is_restricted(verdict),
            format!(
                "{role} should not access {} (landed on {landed}, {verdict:?})",
                page.file_name()
            ),
        )?;
        info!("✓ {role} correctly restricted from {}", page.file_name());
        Ok(())
    }

    /// Without a session every protected page must bounce to the login page.
    async fn expect_login_required(&self, page: Page) -> anyhow::Result<()> {
        let (landed, verdict) = self.probe(page).await?;
        assert_required(
            verdict == AccessVerdict::RedirectedToLogin,
            format!(
                "{} reachable without login (landed on {landed}, {verdict:?})",
                page.file_name()
            ),
        )?;
        info!("✓ {} redirects to login", page.file_name());
        Ok(())
    }

    async fn expect_granted(&self, role: Role, page: Page) -> anyhow::Result<()> {
        let (landed, verdict) = self.probe(page).await?;
        assert_required(
            verdict == AccessVerdict::Granted,
            format!(
                "{role} should access {} (landed on {landed}, {verdict:?})",
                page.file_name()
            ),
        )?;
        info!("✓ {role} can access {}", page.file_name());
        Ok(())
    }
}

/// Seconds since the epoch, for titles that must differ between runs.
fn run_stamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
