//! The single browser session shared by every workflow in a run.
//!
//! All synchronization is condition based: after navigating we wait for the
//! document to be ready, element lookups poll until a deadline, and actions
//! that may trigger a page load wait until either a new document has loaded
//! or a short settle window has passed.

use std::{
    path::Path,
    time::{Duration, Instant},
};

pub use fantoccini::elements::Element;
use fantoccini::{
    Client, ClientBuilder, Locator,
    error::{CmdError, NewSessionError},
};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::HubConfig,
    pages::{Page, SiteMap},
};

/// WebDriver key code for Enter.
const ENTER: &str = "\u{E007}";

const MARK_DOCUMENT: &str = "window.__eduHubStale = true; return true;";
const DOCUMENT_STATE: &str =
    "return window.__eduHubStale === true ? 'stale' : document.readyState;";
const READY_STATE: &str = "return document.readyState;";

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("could not start a WebDriver session: {0}")]
    Connect(#[from] NewSessionError),
    #[error("webdriver command failed: {0}")]
    Command(#[from] CmdError),
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },
    #[error("no element matches {what}")]
    NotFound { what: String },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowserError::NotFound { .. })
    }
}

/// How an element is located on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// `name` attribute, as used by form fields.
    Name(&'a str),
    Id(&'a str),
    Css(&'a str),
    XPath(&'a str),
}

impl Selector<'_> {
    pub fn describe(&self) -> String {
        match self {
            Selector::Name(name) => format!("element named '{name}'"),
            Selector::Id(id) => format!("element #{id}"),
            Selector::Css(css) => format!("css '{css}'"),
            Selector::XPath(xpath) => format!("xpath '{xpath}'"),
        }
    }

    fn query(&self) -> Query {
        match self {
            Selector::Name(name) => Query::Css(format!("[name=\"{name}\"]")),
            Selector::Id(id) => Query::Id((*id).to_string()),
            Selector::Css(css) => Query::Css((*css).to_string()),
            Selector::XPath(xpath) => Query::XPath((*xpath).to_string()),
        }
    }
}

enum Query {
    Css(String),
    Id(String),
    XPath(String),
}

impl Query {
    fn locator(&self) -> Locator<'_> {
        match self {
            Query::Css(css) => Locator::Css(css),
            Query::Id(id) => Locator::Id(id),
            Query::XPath(xpath) => Locator::XPath(xpath),
        }
    }
}

/// Result of an action that may or may not load a new page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Navigated,
    Stayed,
}

struct Deadline {
    started: Instant,
    timeout: Duration,
}

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self {
            started: Instant::now(),
            timeout,
        }
    }

    fn expired(&self) -> bool {
        self.started.elapsed() >= self.timeout
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Chrome capabilities for the run: maximized window, no password-manager
/// popups, downloads going straight into `download_dir`.
pub fn chrome_capabilities(config: &HubConfig, download_dir: &Path) -> Map<String, Value> {
    let mut args = vec!["--start-maximized"];
    if config.headless {
        args.push("--headless=new");
    }
    let options = json!({
        "args": args,
        "prefs": {
            "credentials_enable_service": false,
            "profile.password_manager_enabled": false,
            "profile.password_manager_leak_detection": false,
            "download.default_directory": download_dir.display().to_string(),
            "download.prompt_for_download": false,
        },
    });

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), options);
    caps
}

#[derive(Debug, Clone)]
pub struct BrowserSession {
    client: Client,
    site: SiteMap,
    wait_timeout: Duration,
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl BrowserSession {
    pub async fn connect(config: &HubConfig, download_dir: &Path) -> Result<Self, BrowserError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(chrome_capabilities(config, download_dir));
        let client = builder.connect(&config.webdriver_url).await?;
        debug!("WebDriver session started at {}", config.webdriver_url);

        Ok(Self {
            client,
            site: SiteMap::new(config.base_url.clone()),
            wait_timeout: config.wait_timeout(),
            settle_timeout: config.settle_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    pub fn site(&self) -> &SiteMap {
        &self.site
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Navigates to `page` and waits for it to finish loading. Returns the
    /// URL the browser ended up on, which differs from the requested one
    /// when the application redirects.
    pub async fn open(&self, page: Page) -> Result<Url, BrowserError> {
        let url = self.site.url(page);
        debug!("🔗 Navigating to: {url}");
        self.client.goto(url.as_str()).await?;
        self.wait_ready().await?;
        let landed = self.current_url().await?;
        debug!("📍 Current URL: {landed}");
        Ok(landed)
    }

    pub async fn wait_ready(&self) -> Result<(), BrowserError> {
        let deadline = Deadline::after(self.wait_timeout);
        loop {
            // Errors while a navigation is in flight are expected; keep polling.
            if let Ok(state) = self.client.execute(READY_STATE, vec![]).await {
                if state.as_str() == Some("complete") {
                    return Ok(());
                }
            }
            if deadline.expired() {
                return Err(BrowserError::Timeout {
                    what: "document ready state".to_string(),
                    waited: deadline.elapsed(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    pub async fn current_url(&self) -> Result<Url, BrowserError> {
        Ok(self.client.current_url().await?)
    }

    pub async fn title(&self) -> Result<String, BrowserError> {
        Ok(self.client.title().await?)
    }

    pub async fn source(&self) -> Result<String, BrowserError> {
        Ok(self.client.source().await?)
    }

    pub async fn find_all(&self, selector: Selector<'_>) -> Result<Vec<Element>, BrowserError> {
        let query = selector.query();
        Ok(self.client.find_all(query.locator()).await?)
    }

    /// Looks the element up once, without waiting.
    pub async fn find(&self, selector: Selector<'_>) -> Result<Option<Element>, BrowserError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// Like [`Self::find`], but a missing element is an error.
    pub async fn require(&self, selector: Selector<'_>) -> Result<Element, BrowserError> {
        self.find(selector)
            .await?
            .ok_or_else(|| BrowserError::NotFound {
                what: selector.describe(),
            })
    }

    /// Polls for the element until `timeout` elapses.
    pub async fn wait_for(
        &self,
        selector: Selector<'_>,
        timeout: Duration,
    ) -> Result<Element, BrowserError> {
        let deadline = Deadline::after(timeout);
        loop {
            if let Some(element) = self.find(selector).await? {
                return Ok(element);
            }
            if deadline.expired() {
                return Err(BrowserError::Timeout {
                    what: selector.describe(),
                    waited: deadline.elapsed(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Replaces the field's value with `text`.
    pub async fn fill(&self, selector: Selector<'_>, text: &str) -> Result<(), BrowserError> {
        let element = self.require(selector).await?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    /// Sets a file input to `path`. File inputs cannot be cleared, so this
    /// does not go through [`Self::fill`].
    pub async fn attach(&self, selector: Selector<'_>, path: &Path) -> Result<(), BrowserError> {
        let element = self.require(selector).await?;
        element.send_keys(&path.display().to_string()).await?;
        Ok(())
    }

    pub async fn select_index(
        &self,
        selector: Selector<'_>,
        index: usize,
    ) -> Result<(), BrowserError> {
        let element = self.require(selector).await?;
        element.select_by_index(index).await?;
        Ok(())
    }

    pub async fn select_value(
        &self,
        selector: Selector<'_>,
        value: &str,
    ) -> Result<(), BrowserError> {
        let element = self.require(selector).await?;
        element.select_by_value(value).await?;
        Ok(())
    }

    pub async fn click_and_settle(&self, element: &Element) -> Result<Settled, BrowserError> {
        self.mark_document().await?;
        element.click().await?;
        self.settle().await
    }

    /// Presses Enter in `element`, which submits the surrounding form.
    pub async fn submit_and_settle(&self, element: &Element) -> Result<Settled, BrowserError> {
        self.mark_document().await?;
        element.send_keys(ENTER).await?;
        self.settle().await
    }

    /// Clicks without waiting for a page load, for controls that only change
    /// the current page (menus, tabs).
    pub async fn press(&self, selector: Selector<'_>) -> Result<(), BrowserError> {
        let element = self.require(selector).await?;
        element.click().await?;
        Ok(())
    }

    /// Finds the element and clicks it.
    pub async fn click(&self, selector: Selector<'_>) -> Result<Settled, BrowserError> {
        let element = self.require(selector).await?;
        self.click_and_settle(&element).await
    }

    async fn mark_document(&self) -> Result<(), BrowserError> {
        self.client.execute(MARK_DOCUMENT, vec![]).await?;
        Ok(())
    }

    /// Waits for a document other than the marked one to finish loading.
    ///
    /// If nothing replaced the marked document within the settle window the
    /// action was handled in-page.
    async fn settle(&self) -> Result<Settled, BrowserError> {
        let deadline = Deadline::after(self.settle_timeout);
        let mut left_marked_document = false;
        loop {
            match self.client.execute(DOCUMENT_STATE, vec![]).await {
                Ok(state) => match state.as_str() {
                    Some("complete") => return Ok(Settled::Navigated),
                    Some("stale") => {}
                    _ => left_marked_document = true,
                },
                Err(_) => left_marked_document = true,
            }
            if deadline.expired() {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        if left_marked_document {
            // A navigation started but is slower than the settle window.
            self.wait_ready().await?;
            return Ok(Settled::Navigated);
        }
        Ok(Settled::Stayed)
    }

    pub async fn screenshot_to(&self, path: &Path) -> Result<(), BrowserError> {
        let png = self.client.screenshot().await?;
        std::fs::write(path, png)?;
        Ok(())
    }

    /// Ends the WebDriver session, which terminates the browser.
    pub async fn quit(&self) {
        if let Err(err) = self.client.clone().close().await {
            warn!("Closing the browser failed: {err}");
        }
    }
}
