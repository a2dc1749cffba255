use url::Url;

/// Pages of the Education Hub application the suite drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    Register,
    Logout,
    Dashboard,
    NotesManagement,
    SearchNotes,
    Quiz,
    Performance,
    UploadNotes,
    ManageQuestions,
    TeacherPerformance,
    AdminDashboard,
    AdminUsers,
}

impl Page {
    pub const ALL: [Page; 13] = [
        Page::Login,
        Page::Register,
        Page::Logout,
        Page::Dashboard,
        Page::NotesManagement,
        Page::SearchNotes,
        Page::Quiz,
        Page::Performance,
        Page::UploadNotes,
        Page::ManageQuestions,
        Page::TeacherPerformance,
        Page::AdminDashboard,
        Page::AdminUsers,
    ];

    /// Path relative to the application's base URL.
    pub fn path(self) -> &'static str {
        match self {
            Page::Login => "/auth/login.php",
            Page::Register => "/auth/register.php",
            Page::Logout => "/auth/logout.php",
            Page::Dashboard => "/dashboard.php",
            Page::NotesManagement => "/notes_management.php",
            Page::SearchNotes => "/search_notes.php",
            Page::Quiz => "/quiz.php",
            Page::Performance => "/performance.php",
            Page::UploadNotes => "/upload_notes.php",
            Page::ManageQuestions => "/manage_questions.php",
            Page::TeacherPerformance => "/teacher_performance.php",
            Page::AdminDashboard => "/admin/dashboard.php",
            Page::AdminUsers => "/admin/users.php",
        }
    }

    pub fn file_name(self) -> &'static str {
        let path = self.path();
        path.rsplit('/').next().unwrap_or(path)
    }

    pub fn is_dashboard(self) -> bool {
        matches!(self, Page::Dashboard | Page::AdminDashboard)
    }

    /// Whether the page needs a logged-in user.
    pub fn is_protected(self) -> bool {
        !matches!(self, Page::Login | Page::Register | Page::Logout)
    }
}

/// Maps pages to absolute URLs under a base URL, and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMap {
    base: Url,
}

impl SiteMap {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn url(&self, page: Page) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}{}", self.base.path().trim_end_matches('/'), page.path());
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// The page `url` points at, if it is one of ours.
    ///
    /// Matching is done on the path below the base path, so the user
    /// dashboard and the admin dashboard are told apart.
    pub fn page_of(&self, url: &Url) -> Option<Page> {
        if url.host_str() != self.base.host_str() || url.port() != self.base.port() {
            return None;
        }
        let base_path = self.base.path().trim_end_matches('/');
        let relative = url.path().strip_prefix(base_path)?;
        Page::ALL.into_iter().find(|page| page.path() == relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteMap {
        SiteMap::new(Url::parse("http://localhost/education_hub%20-%20Copy").unwrap())
    }

    #[test]
    fn urls_are_built_below_the_base_path() {
        let site = site();
        assert_eq!(
            site.url(Page::Login).as_str(),
            "http://localhost/education_hub%20-%20Copy/auth/login.php"
        );
        assert_eq!(
            site.url(Page::AdminUsers).as_str(),
            "http://localhost/education_hub%20-%20Copy/admin/users.php"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_tolerated() {
        let site = SiteMap::new(Url::parse("http://hub.test/app/").unwrap());
        assert_eq!(
            site.url(Page::Quiz).as_str(),
            "http://hub.test/app/quiz.php"
        );
    }

    #[test]
    fn every_page_round_trips() {
        let site = site();
        for page in Page::ALL {
            assert_eq!(site.page_of(&site.url(page)), Some(page), "{page:?}");
        }
    }

    #[test]
    fn dashboards_are_not_confused() {
        let site = site();
        let admin = Url::parse("http://localhost/education_hub%20-%20Copy/admin/dashboard.php")
            .unwrap();
        let user =
            Url::parse("http://localhost/education_hub%20-%20Copy/dashboard.php?tab=stats")
                .unwrap();
        assert_eq!(site.page_of(&admin), Some(Page::AdminDashboard));
        assert_eq!(site.page_of(&user), Some(Page::Dashboard));
    }

    #[test]
    fn foreign_urls_are_not_pages() {
        let site = site();
        let other_host =
            Url::parse("http://example.com/education_hub%20-%20Copy/quiz.php").unwrap();
        let unknown =
            Url::parse("http://localhost/education_hub%20-%20Copy/profile.php").unwrap();
        assert_eq!(site.page_of(&other_host), None);
        assert_eq!(site.page_of(&unknown), None);
    }

    #[test]
    fn only_auth_pages_are_public() {
        let public: Vec<_> = Page::ALL
            .into_iter()
            .filter(|page| !page.is_protected())
            .collect();
        assert_eq!(public, [Page::Login, Page::Register, Page::Logout]);
        assert!(Page::AdminUsers.is_protected());
        assert!(Page::SearchNotes.is_protected());
    }

    #[test]
    fn file_names() {
        assert_eq!(Page::UploadNotes.file_name(), "upload_notes.php");
        assert_eq!(Page::AdminDashboard.file_name(), "dashboard.php");
    }
}
