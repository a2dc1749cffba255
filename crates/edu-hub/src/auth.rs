use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    config::{Credentials, HubConfig},
    pages::Page,
    session::{BrowserError, BrowserSession, Selector},
};

const LOGOUT_LINK: &str = "//a[contains(@href, 'logout')]";
/// The account menu opens in-page, so its link shows up quickly or not at all.
const MENU_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the browser is after a login attempt, judged from the URL alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Dashboard,
    OnLoginPage,
    Elsewhere,
}

impl LoginState {
    pub fn classify(url: &Url) -> Self {
        let url = url.as_str().to_lowercase();
        if url.contains("dashboard") {
            LoginState::Dashboard
        } else if url.contains("login") {
            LoginState::OnLoginPage
        } else {
            LoginState::Elsewhere
        }
    }

    /// On a dashboard, or at least no longer on the login page.
    pub fn is_success(self) -> bool {
        self != LoginState::OnLoginPage
    }
}

/// Logs roles in and out of the shared session.
#[derive(Debug, Clone)]
pub struct Auth {
    session: Arc<BrowserSession>,
    login_timeout: Duration,
    screenshot_path: PathBuf,
}

impl Auth {
    pub fn new(session: Arc<BrowserSession>, config: &HubConfig) -> Self {
        Self {
            session,
            login_timeout: config.login_timeout(),
            screenshot_path: config.login_screenshot.clone(),
        }
    }

    /// Logs in through the login form.
    ///
    /// Returns early without touching the form if the login page redirects
    /// (already authenticated, or somewhere unexpected). Any failure while
    /// filling and submitting the form is escalated after a diagnostic
    /// screenshot.
    pub async fn login(&self, credentials: &Credentials) -> anyhow::Result<LoginState> {
        info!("🔑 Logging in as {} ({})", credentials.role, credentials.email);
        let landed = self.session.open(Page::Login).await?;
        match LoginState::classify(&landed) {
            LoginState::Dashboard => {
                info!("✅ Already logged in - redirected to dashboard");
                return Ok(LoginState::Dashboard);
            }
            LoginState::Elsewhere => {
                warn!("⚠️ Unexpected redirect to: {landed}");
                return Ok(LoginState::Elsewhere);
            }
            LoginState::OnLoginPage => {}
        }

        match self.submit_login_form(credentials).await {
            Ok(state) => Ok(state),
            Err(err) => {
                error!("❌ Login process failed: {err}");
                if let Err(shot_err) = self.session.screenshot_to(&self.screenshot_path).await {
                    debug!("Could not save login screenshot: {shot_err}");
                }
                Err::<LoginState, _>(err)
                    .with_context(|| format!("login as {} failed", credentials.email))
            }
        }
    }

    async fn submit_login_form(
        &self,
        credentials: &Credentials,
    ) -> Result<LoginState, BrowserError> {
        self.session
            .wait_for(Selector::Name("email"), self.login_timeout)
            .await?;
        self.session
            .fill(Selector::Name("email"), &credentials.email)
            .await?;
        self.session
            .fill(Selector::Name("password"), &credentials.password)
            .await?;
        let password = self.session.require(Selector::Name("password")).await?;
        self.session.submit_and_settle(&password).await?;
        debug!("🚀 Submitted login form");

        let final_url = self.session.current_url().await?;
        let state = LoginState::classify(&final_url);
        if state.is_success() {
            info!("✅ Login successful");
        } else {
            warn!("❌ Login may have failed - still on: {final_url}");
        }
        Ok(state)
    }

    /// Logs in, retrying with a fixed backoff while the browser stays on
    /// the login page. See [`retry_login`].
    pub async fn login_with_retry(
        &self,
        credentials: &Credentials,
        attempts: u32,
        backoff: Duration,
    ) -> anyhow::Result<LoginState> {
        retry_login(attempts, backoff, |_| self.login(credentials)).await
    }

    /// Logs out through the account menu, falling back to the logout URL.
    /// Never fails.
    pub async fn logout(&self) {
        if let Err(err) = self.logout_via_menu().await {
            debug!("Menu logout unavailable ({err}), using {}", Page::Logout.path());
            if let Err(err) = self.session.open(Page::Logout).await {
                warn!("Direct logout failed: {err}");
            }
        }
    }

    async fn logout_via_menu(&self) -> Result<(), BrowserError> {
        self.session.press(Selector::Id("header-avatar")).await?;
        let link = self
            .session
            .wait_for(Selector::XPath(LOGOUT_LINK), MENU_TIMEOUT)
            .await?;
        self.session.click_and_settle(&link).await?;
        Ok(())
    }

    /// Whether the current page offers a logout link.
    pub async fn is_logged_in(&self) -> Result<bool, BrowserError> {
        let links = self.session.find_all(Selector::XPath(LOGOUT_LINK)).await?;
        Ok(!links.is_empty())
    }
}

/// Runs `attempt` until it leaves the login page, at most `attempts` times
/// (at least once) with `backoff` between tries. Errors are retried too; the
/// last attempt's outcome is returned as is.
pub async fn retry_login<F, Fut>(
    attempts: u32,
    backoff: Duration,
    mut attempt: F,
) -> anyhow::Result<LoginState>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<LoginState>>,
{
    let attempts = attempts.max(1);
    let mut current = 1;
    loop {
        match attempt(current).await {
            Ok(state) if state.is_success() => return Ok(state),
            Ok(state) => {
                warn!("⚠️ Login attempt {current} did not leave the login page");
                if current == attempts {
                    error!("❌ Login failed after {attempts} attempts");
                    return Ok(state);
                }
            }
            Err(err) => {
                warn!("❌ Login attempt {current} error: {err:#}");
                if current == attempts {
                    return Err(err);
                }
            }
        }
        current += 1;
        tokio::time::sleep(backoff).await;
    }
}
