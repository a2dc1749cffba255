use edu_hub_runner::{assert_optional, assert_required, soft_step};
use tracing::info;

use super::{
    EducationHub, student,
    teacher::{self, NoteForm},
};
use crate::{access::contains_any, config::Role, pages::Page};

const E2E_NOTE_TITLE: &str = "End-to-End Test Note";
const E2E_NOTE_CONTENT: &str = "Note created in end-to-end test";

/// Teacher pages the admin role shares, plus the admin area itself.
const ADMIN_REACHABLE: [Page; 4] = [
    Page::UploadNotes,
    Page::ManageQuestions,
    Page::AdminDashboard,
    Page::AdminUsers,
];

pub(super) async fn run(hub: &EducationHub) -> anyhow::Result<()> {
    hub.auth.logout().await;

    hub.auth.login(&hub.credentials(Role::Admin)).await?;
    hub.open(Page::AdminDashboard).await?;
    let source = hub.source().await?;
    assert_required(
        contains_any(&source, &["Admin Dashboard", "Admin Panel"]),
        "admin dashboard marker missing",
    )?;
    info!("✓ Admin dashboard accessible");

    hub.open(Page::AdminUsers).await?;
    let source = hub.source().await?;
    assert_required(source.contains("All Users"), "user management marker missing")?;
    if source.contains("approve_teacher") {
        info!("✓ Pending teacher approvals listed");
    } else {
        info!("✓ No teachers pending approval");
    }
    for page in ADMIN_REACHABLE {
        hub.expect_granted(Role::Admin, page).await?;
    }
    hub.auth.logout().await;

    hub.auth.login(&hub.credentials(Role::Teacher)).await?;
    hub.open(Page::UploadNotes).await?;
    if soft_step("✓ Teacher note upload", upload_e2e_note(hub))
        .await
        .is_some()
    {
        info!("✓ Teacher uploaded '{E2E_NOTE_TITLE}'");
    }
    hub.auth.logout().await;

    hub.auth.login(&hub.credentials(Role::Student)).await?;
    hub.open(Page::SearchNotes).await?;
    if soft_step(
        "✓ Student search",
        student::search_notes(hub, E2E_NOTE_TITLE),
    )
    .await
    .is_some()
    {
        let source = hub.source().await?;
        if assert_optional(
            source.contains(E2E_NOTE_TITLE),
            format!("search results do not mention '{E2E_NOTE_TITLE}'"),
        ) {
            info!("✓ Student found the teacher's note");
        }
    }
    hub.auth.logout().await;

    info!("✓ End-to-end workflow completed");
    Ok(())
}

async fn upload_e2e_note(hub: &EducationHub) -> anyhow::Result<()> {
    let attachment = hub
        .fixtures
        .create_test_file("e2e_note.txt", E2E_NOTE_CONTENT)?;
    teacher::submit_note(
        hub,
        &NoteForm {
            title: E2E_NOTE_TITLE,
            content: E2E_NOTE_CONTENT,
            attachment: Some(&attachment),
        },
    )
    .await
}
