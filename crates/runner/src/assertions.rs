//! Two-tier assertions for workflow tests.
//!
//! A *required* check aborts the current test and is reported as a failure.
//! An *optional* check only logs, so that a secondary UI affordance being
//! absent does not invalidate the workflow around it.

use std::future::Future;

/// Error raised by [`assert_required`]. The runner reports tests that end
/// with this error anywhere in their chain as failures rather than errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("assertion failed: {message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Hard assertion: `Err` if `condition` does not hold.
pub fn assert_required(
    condition: bool,
    message: impl Into<String>,
) -> Result<(), AssertionFailure> {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(message))
    }
}

/// Soft assertion: logs a warning if `condition` does not hold and hands the
/// condition back to the caller.
pub fn assert_optional(condition: bool, message: impl AsRef<str>) -> bool {
    if !condition {
        tracing::warn!("soft check did not hold: {}", message.as_ref());
    }
    condition
}

/// Runs a step whose failure must not abort the test.
///
/// On error the step is logged at `warn` with its label and `None` is
/// returned.
pub async fn soft_step<T, F>(label: &str, step: F) -> Option<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match step.await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("{label} (skipped: {err:#})");
            None
        }
    }
}

/// Whether `err` carries an [`AssertionFailure`] anywhere in its chain.
pub fn is_assertion_failure(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<AssertionFailure>().is_some())
}

#[cfg(test)]
mod tests {
    use anyhow::Context as _;

    use super::*;

    #[test]
    fn required_reports_message() {
        assert!(assert_required(true, "fine").is_ok());
        let err = assert_required(false, "Admin Dashboard marker missing").unwrap_err();
        assert_eq!(err.message(), "Admin Dashboard marker missing");
        assert_eq!(
            err.to_string(),
            "assertion failed: Admin Dashboard marker missing"
        );
    }

    #[test]
    fn optional_returns_condition() {
        assert!(assert_optional(true, "present"));
        assert!(!assert_optional(false, "absent"));
    }

    #[test]
    fn failure_is_found_through_context() {
        let err = anyhow::Error::new(AssertionFailure::new("missing"))
            .context("while checking dashboard");
        assert!(is_assertion_failure(&err));

        let err: anyhow::Error = Err::<(), _>(std::io::Error::other("boom"))
            .context("while writing fixture")
            .unwrap_err();
        assert!(!is_assertion_failure(&err));
    }

    #[tokio::test]
    async fn soft_step_swallows_errors() {
        let ok = soft_step("search tab", async { Ok::<_, anyhow::Error>(3) }).await;
        assert_eq!(ok, Some(3));

        let failed: Option<()> =
            soft_step("search tab", async { Err(anyhow::anyhow!("no such element")) }).await;
        assert_eq!(failed, None);
    }
}
