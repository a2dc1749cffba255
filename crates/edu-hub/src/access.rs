//! Reading access-control and form outcomes off rendered pages.

use url::Url;

use crate::pages::{Page, SiteMap};

const DENIAL_MARKERS: [&str; 2] = ["unauthorized", "access denied"];
const LOGIN_ERROR_MARKERS: [&str; 3] = ["invalid", "error", "incorrect"];

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn contains_any_ignore_case(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

/// Whether the login page reports a rejected credential pair.
pub fn invalid_login_reported(page_source: &str) -> bool {
    contains_any_ignore_case(page_source, &LOGIN_ERROR_MARKERS)
}

/// What happened when a protected page was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    /// The page rendered an explicit denial.
    Denied,
    RedirectedToLogin,
    /// Sent to a dashboard other than the requested page.
    RedirectedToDashboard(Page),
    Granted,
}

impl AccessVerdict {
    pub fn judge(site: &SiteMap, target: Page, landed: &Url, page_source: &str) -> Self {
        if contains_any_ignore_case(page_source, &DENIAL_MARKERS) {
            return AccessVerdict::Denied;
        }
        match site.page_of(landed) {
            Some(Page::Login) => AccessVerdict::RedirectedToLogin,
            Some(page) if page.is_dashboard() && page != target => {
                AccessVerdict::RedirectedToDashboard(page)
            }
            Some(_) => AccessVerdict::Granted,
            // Unknown location below the base: fall back to the URL text.
            None if landed.path().to_lowercase().contains("login") => {
                AccessVerdict::RedirectedToLogin
            }
            None => AccessVerdict::Granted,
        }
    }
}

/// Which verdicts count as "access restricted" for a role.
///
/// Landing on the admin dashboard is never a restriction: it means the
/// role got into the admin area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionPolicy {
    /// Denial, a forced login or a redirect to the user dashboard.
    Student,
    /// Denial or a redirect to the teacher's own dashboard.
    Teacher,
}

impl RestrictionPolicy {
    pub fn is_restricted(self, verdict: AccessVerdict) -> bool {
        match verdict {
            AccessVerdict::Denied => true,
            AccessVerdict::RedirectedToDashboard(page) => page == Page::Dashboard,
            AccessVerdict::RedirectedToLogin => self == RestrictionPolicy::Student,
            AccessVerdict::Granted => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteMap {
        SiteMap::new(Url::parse("http://localhost/education_hub").unwrap())
    }

    fn at(path: &str) -> Url {
        Url::parse(&format!("http://localhost/education_hub{path}")).unwrap()
    }

    #[test]
    fn explicit_denial_wins() {
        let verdict = AccessVerdict::judge(
            &site(),
            Page::UploadNotes,
            &at("/upload_notes.php"),
            "<h1>Access Denied</h1>",
        );
        assert_eq!(verdict, AccessVerdict::Denied);
        let verdict = AccessVerdict::judge(
            &site(),
            Page::UploadNotes,
            &at("/upload_notes.php"),
            "401 UNAUTHORIZED",
        );
        assert_eq!(verdict, AccessVerdict::Denied);
    }

    #[test]
    fn redirects_are_classified() {
        let site = site();
        assert_eq!(
            AccessVerdict::judge(&site, Page::ManageQuestions, &at("/auth/login.php"), ""),
            AccessVerdict::RedirectedToLogin
        );
        assert_eq!(
            AccessVerdict::judge(&site, Page::AdminDashboard, &at("/dashboard.php"), ""),
            AccessVerdict::RedirectedToDashboard(Page::Dashboard)
        );
        assert_eq!(
            AccessVerdict::judge(&site, Page::UploadNotes, &at("/upload_notes.php"), "Upload"),
            AccessVerdict::Granted
        );
    }

    #[test]
    fn landing_on_the_target_dashboard_is_access() {
        let verdict = AccessVerdict::judge(
            &site(),
            Page::AdminDashboard,
            &at("/admin/dashboard.php"),
            "<h1>Admin Dashboard</h1>",
        );
        assert_eq!(verdict, AccessVerdict::Granted);
    }

    #[test]
    fn student_policy_accepts_all_restrictions() {
        let policy = RestrictionPolicy::Student;
        assert!(policy.is_restricted(AccessVerdict::Denied));
        assert!(policy.is_restricted(AccessVerdict::RedirectedToLogin));
        assert!(policy.is_restricted(AccessVerdict::RedirectedToDashboard(Page::Dashboard)));
        assert!(!policy.is_restricted(AccessVerdict::Granted));
    }

    #[test]
    fn teacher_policy_does_not_accept_login_redirect() {
        let policy = RestrictionPolicy::Teacher;
        assert!(policy.is_restricted(AccessVerdict::Denied));
        assert!(policy.is_restricted(AccessVerdict::RedirectedToDashboard(Page::Dashboard)));
        assert!(!policy.is_restricted(AccessVerdict::RedirectedToLogin));
        assert!(!policy.is_restricted(AccessVerdict::Granted));
    }

    #[test]
    fn landing_on_the_admin_dashboard_is_never_a_restriction() {
        let site = site();
        let admin_area = at("/admin/dashboard.php");
        let source = "<h1>Admin Dashboard</h1>";

        let student = AccessVerdict::judge(&site, Page::UploadNotes, &admin_area, source);
        assert_eq!(
            student,
            AccessVerdict::RedirectedToDashboard(Page::AdminDashboard)
        );
        assert!(!RestrictionPolicy::Student.is_restricted(student));

        let teacher = AccessVerdict::judge(&site, Page::AdminUsers, &admin_area, source);
        assert_eq!(
            teacher,
            AccessVerdict::RedirectedToDashboard(Page::AdminDashboard)
        );
        assert!(!RestrictionPolicy::Teacher.is_restricted(teacher));
    }

    #[test]
    fn protected_pages_bouncing_to_login_are_recognised() {
        let site = site();
        let login = at("/auth/login.php?error=Please+login+first");
        for page in Page::ALL.into_iter().filter(|page| page.is_protected()) {
            assert_eq!(
                AccessVerdict::judge(&site, page, &login, "<h1>Login</h1>"),
                AccessVerdict::RedirectedToLogin,
                "{page:?}"
            );
        }
    }

    #[test]
    fn admin_reaching_teacher_and_admin_pages_is_granted() {
        let site = site();
        for page in [Page::UploadNotes, Page::ManageQuestions, Page::AdminUsers] {
            let landed = site.url(page);
            assert_eq!(
                AccessVerdict::judge(&site, page, &landed, "<h1>Manage</h1>"),
                AccessVerdict::Granted,
                "{page:?}"
            );
        }
    }

    #[test]
    fn invalid_login_markers_are_case_insensitive() {
        assert!(invalid_login_reported("<div class=alert>Invalid email or password</div>"));
        assert!(invalid_login_reported("Password INCORRECT"));
        assert!(invalid_login_reported("<p class=\"error\">Try again</p>"));
        assert!(!invalid_login_reported("<h1>Welcome back</h1>"));
    }

    #[test]
    fn marker_helpers() {
        assert!(contains_any("Admin Panel", &["Admin Dashboard", "Admin Panel"]));
        assert!(!contains_any("admin panel", &["Admin Panel"]));
        assert!(contains_any_ignore_case("admin panel", &["Admin Panel"]));
    }
}
