use edu_hub_runner::{assert_optional, assert_required};
use tracing::info;

use super::EducationHub;
use crate::{access::invalid_login_reported, config::Role, pages::Page, session::Selector};

const INVALID_EMAIL: &str = "invalid@email.com";
const INVALID_PASSWORD: &str = "wrongpassword";

pub(super) async fn run(hub: &EducationHub) -> anyhow::Result<()> {
    // Login page
    hub.open(Page::Login).await?;
    let title = hub.title().await?;
    assert_required(
        title.contains("Education Hub"),
        format!("login page title was '{title}'"),
    )?;
    let email = hub
        .session
        .wait_for(Selector::Name("email"), hub.session.wait_timeout())
        .await?;
    assert_required(email.is_displayed().await?, "email field is not displayed")?;
    info!("✓ Login page loads correctly");

    // Registration page
    hub.open(Page::Register).await?;
    let title = hub.title().await?;
    assert_required(
        title.contains("Register"),
        format!("registration page title was '{title}'"),
    )?;
    info!("✓ Registration page loads correctly");

    // Rejected credentials
    hub.open(Page::Login).await?;
    hub.session.fill(Selector::Name("email"), INVALID_EMAIL).await?;
    hub.session
        .fill(Selector::Name("password"), INVALID_PASSWORD)
        .await?;
    let password = hub.session.require(Selector::Name("password")).await?;
    hub.session.submit_and_settle(&password).await?;
    let source = hub.source().await?;
    assert_required(
        invalid_login_reported(&source),
        "invalid login did not surface an error",
    )?;
    info!("✓ Invalid login shows error");

    let state = hub.auth.login(&hub.credentials(Role::Admin)).await?;
    assert_required(
        state.is_success(),
        "admin login did not leave the login page",
    )?;
    info!("✓ Admin login successful");

    hub.auth.logout().await;
    if let Ok(logged_in) = hub.auth.is_logged_in().await {
        assert_optional(!logged_in, "logout link still offered after logout");
    }
    info!("✓ Logout successful");

    // Logging out while logged out goes through the fallback and must not fail.
    hub.auth.logout().await;
    info!("✓ Repeated logout is harmless");

    for page in Page::ALL.into_iter().filter(|page| page.is_protected()) {
        hub.expect_login_required(page).await?;
    }
    info!("✓ Protected pages require login");

    Ok(())
}
