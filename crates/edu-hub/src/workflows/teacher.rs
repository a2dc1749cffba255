use std::path::Path;

use edu_hub_runner::{assert_optional, assert_required, soft_step};
use tracing::{info, warn};

use super::{EducationHub, SUBMIT_BUTTON, run_stamp};
use crate::{
    access::{RestrictionPolicy, contains_any},
    config::{Credentials, Role},
    pages::Page,
    session::Selector,
};

const APPROVE_BUTTON: Selector<'static> = Selector::Name("approve_teacher");
const MY_UPLOADS_TAB: Selector<'static> =
    Selector::XPath("//button[contains(text(), 'My Uploads')]");
const UPLOAD_TAB: Selector<'static> =
    Selector::XPath("//button[contains(text(), 'Upload Notes')]");

const TEACHER_MARKERS: [&str; 4] = ["Upload Notes", "Manage Questions", "Teacher", "teacher"];
const TEACHER_DASHBOARD_MARKERS: [&str; 4] =
    ["Dashboard", "Upload Notes", "Manage Questions", "Teacher"];
const TEACHER_RESTRICTED: [Page; 2] = [Page::AdminDashboard, Page::AdminUsers];

const TEACHER_NAME: &str = "Test Teacher";
const TEACHER_MOBILE: &str = "+919876543211";

/// Fields of the note upload form.
pub(super) struct NoteForm<'a> {
    pub(super) title: &'a str,
    pub(super) content: &'a str,
    pub(super) attachment: Option<&'a Path>,
}

/// As admin, makes sure the teacher account exists and is approved.
pub(super) async fn setup(hub: &EducationHub) -> anyhow::Result<()> {
    hub.auth.logout().await;

    hub.auth.login(&hub.credentials(Role::Admin)).await?;
    ensure_teacher_approved(hub).await?;
    info!("✓ Teacher setup check completed");

    hub.auth.logout().await;
    Ok(())
}

pub(super) async fn run(hub: &EducationHub) -> anyhow::Result<()> {
    hub.auth.logout().await;

    info!("🔄 Attempting teacher login...");
    let state = hub
        .auth
        .login_with_retry(
            &hub.credentials(Role::Teacher),
            hub.config.teacher_login_attempts,
            hub.config.teacher_login_backoff(),
        )
        .await?;
    if state.is_success() {
        info!("✓ Teacher login successful");
    }

    let source = hub.source().await?;
    if assert_optional(
        contains_any(&source, &TEACHER_MARKERS),
        "Could not verify teacher login, continuing with test...",
    ) {
        info!("✓ Teacher login verified");
    }

    hub.open(Page::Dashboard).await?;
    let source = hub.source().await?;
    assert_required(
        contains_any(&source, &TEACHER_DASHBOARD_MARKERS),
        "Teacher dashboard not accessible",
    )?;
    info!("✓ Teacher dashboard loads");

    hub.open(Page::NotesManagement).await?;
    let my_uploads = async {
        hub.session
            .press(MY_UPLOADS_TAB)
            .await
            .map_err(anyhow::Error::from)
    };
    if soft_step("✓ Notes management tabs accessible", my_uploads)
        .await
        .is_some()
    {
        info!("✓ My Uploads tab accessible");
    }

    upload_note(hub).await?;
    add_question(hub).await?;

    hub.open(Page::TeacherPerformance).await?;
    let source = hub.source().await?;
    assert_required(
        contains_any(&source, &["Performance", "Student"]),
        "teacher performance page marker missing",
    )?;
    info!("✓ Teacher can view student performance");

    for page in TEACHER_RESTRICTED {
        hub.expect_restricted(Role::Teacher, page, RestrictionPolicy::Teacher)
            .await?;
    }

    hub.auth.logout().await;
    info!("✓ Teacher logout successful");
    Ok(())
}

async fn ensure_teacher_approved(hub: &EducationHub) -> anyhow::Result<()> {
    let teacher = hub.credentials(Role::Teacher);
    hub.open(Page::AdminUsers).await?;
    let source = hub.source().await?;

    if source.contains(&teacher.email) {
        info!("✓ Teacher account found in user management");
        if approve_first_pending(hub).await? {
            info!("✓ Admin approved teacher account");
        } else {
            info!("✓ Teacher already approved (no approve button found)");
        }
        return Ok(());
    }

    warn!("⚠️ Teacher account not found - creating one...");
    register(hub, &teacher).await?;
    info!("✓ Teacher account created (pending approval)");

    hub.open(Page::AdminUsers).await?;
    let approved = approve_first_pending(hub).await?;
    assert_required(approved, "Could not approve teacher automatically")?;
    info!("✓ Teacher account approved");
    Ok(())
}

async fn approve_first_pending(hub: &EducationHub) -> anyhow::Result<bool> {
    let Some(button) = hub.session.find(APPROVE_BUTTON).await? else {
        return Ok(false);
    };
    hub.session.click_and_settle(&button).await?;
    Ok(true)
}

async fn register(hub: &EducationHub, account: &Credentials) -> anyhow::Result<()> {
    hub.open(Page::Register).await?;
    let session = &hub.session;
    session.fill(Selector::Name("name"), TEACHER_NAME).await?;
    session.fill(Selector::Name("email"), &account.email).await?;
    session.fill(Selector::Name("mobile"), TEACHER_MOBILE).await?;
    session
        .fill(Selector::Name("password"), &account.password)
        .await?;
    session
        .fill(Selector::Name("confirm_password"), &account.password)
        .await?;
    session
        .select_value(Selector::Name("role"), &account.role.to_string())
        .await?;
    session.click(SUBMIT_BUTTON).await?;
    Ok(())
}

/// Fills and submits the note form on the current page.
pub(super) async fn submit_note(hub: &EducationHub, note: &NoteForm<'_>) -> anyhow::Result<()> {
    let session = &hub.session;
    session.fill(Selector::Name("title"), note.title).await?;
    session
        .select_index(Selector::Name("subject_id"), 1)
        .await?;
    session.fill(Selector::Name("content"), note.content).await?;
    if let Some(path) = note.attachment {
        session.attach(Selector::Name("note_file"), path).await?;
    }
    session.click(SUBMIT_BUTTON).await?;
    Ok(())
}

async fn upload_note(hub: &EducationHub) -> anyhow::Result<()> {
    // The upload form is a tab of notes management; open it directly if
    // the tab is not offered.
    match hub.session.find(UPLOAD_TAB).await? {
        Some(tab) => {
            hub.session.click_and_settle(&tab).await?;
        }
        None => {
            hub.open(Page::UploadNotes).await?;
        }
    }

    let title = format!("Automated Test Note - {}", run_stamp());
    let attachment = hub
        .fixtures
        .create_test_file("test_note.txt", "Test note content for automation testing.")?;
    submit_note(
        hub,
        &NoteForm {
            title: &title,
            content: "This is a test note uploaded by browser automation testing.",
            attachment: Some(&attachment),
        },
    )
    .await?;

    let source = hub.source().await?.to_lowercase();
    let landed = hub.session.current_url().await?;
    assert_required(
        contains_any(&source, &["success", "uploaded"]) || landed.as_str().contains("dashboard"),
        "Note upload failed",
    )?;
    info!("✓ Teacher successfully uploaded note");
    Ok(())
}

async fn add_question(hub: &EducationHub) -> anyhow::Result<()> {
    hub.open(Page::ManageQuestions).await?;

    let question = format!(
        "What is the capital of France? (Automated Test {})",
        run_stamp()
    );
    let session = &hub.session;
    session.fill(Selector::Name("question_text"), &question).await?;
    session.fill(Selector::Name("option_a"), "London").await?;
    session.fill(Selector::Name("option_b"), "Paris").await?;
    session.fill(Selector::Name("option_c"), "Berlin").await?;
    session.fill(Selector::Name("option_d"), "Madrid").await?;
    session
        .select_value(Selector::Name("correct_answer"), "B")
        .await?;
    session
        .select_index(Selector::Name("subject_id"), 1)
        .await?;
    session.click(SUBMIT_BUTTON).await?;

    let source = hub.source().await?.to_lowercase();
    assert_required(
        contains_any(&source, &["success", "added"]),
        "Question addition failed",
    )?;
    info!("✓ Teacher successfully added quiz question");
    Ok(())
}
