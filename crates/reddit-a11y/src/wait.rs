//! Wait mechanisms: page load states and URL changes.
//!
//! Waits poll the page on a fixed interval until a condition holds or the
//! timeout elapses. They never repeat the action that triggered them.

use crate::browser::BrowserPage;
use crate::page_object::UrlMatcher;
use crate::result::{A11yError, A11yResult};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// Whether `document.readyState` satisfies this state
    #[must_use]
    pub fn is_reached_by(&self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load => ready_state == "complete",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Expression reporting the document ready state
pub const READY_STATE_SCRIPT: &str = "/* a11y:ready-state */ document.readyState";

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll `check` until it returns `true`.
///
/// A [transient](A11yError::is_transient) error counts as "not yet": polling
/// continues and the error is kept in case the deadline passes before the
/// next successful check.
///
/// # Errors
///
/// Returns the last transient error if the final poll failed with one, else
/// [`A11yError::Timeout`] naming `what`, when the deadline passes. Any other
/// error from `check` is returned at once.
pub async fn poll_until<F, Fut>(what: &str, options: &WaitOptions, mut check: F) -> A11yResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = A11yResult<bool>>,
{
    let deadline = Instant::now() + options.timeout();
    let mut last_error = None;
    loop {
        match check().await {
            Ok(true) => return Ok(()),
            Ok(false) => last_error = None,
            Err(e) if e.is_transient() => {
                tracing::debug!(what, error = %e, "wait condition not evaluable yet");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Err(last_error.unwrap_or_else(|| A11yError::Timeout {
                what: what.to_string(),
                ms: options.timeout_ms,
            }));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Wait until `document.readyState` reaches `state` by evaluating scripts on
/// the page. Backends without a native load-state wait build on this.
///
/// # Errors
///
/// Returns a timeout error or the page's evaluation error.
pub async fn wait_for_ready_state(
    page: &dyn BrowserPage,
    state: LoadState,
    options: &WaitOptions,
) -> A11yResult<()> {
    let what = format!("load state '{state}'");
    poll_until(&what, options, || async move {
        let ready = page.evaluate(READY_STATE_SCRIPT).await?;
        Ok::<_, A11yError>(ready.as_str().is_some_and(|r| state.is_reached_by(r)))
    })
    .await?;

    tracing::debug!(%state, "load state reached");
    Ok(())
}

/// Wait until the page URL matches `matcher`.
///
/// # Errors
///
/// Returns a timeout error naming the pattern.
pub async fn wait_for_url(
    page: &dyn BrowserPage,
    matcher: &UrlMatcher,
    options: &WaitOptions,
) -> A11yResult<()> {
    let what = format!("URL matching '{}'", matcher.pattern());
    poll_until(&what, options, || async move {
        let url = page.url().await?;
        Ok::<_, A11yError>(matcher.matches_url(&url))
    })
    .await?;
    tracing::debug!(pattern = matcher.pattern(), "URL matched");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_default_is_load() {
            assert_eq!(LoadState::default(), LoadState::Load);
        }

        #[test]
        fn test_display() {
            assert_eq!(LoadState::Load.to_string(), "load");
            assert_eq!(LoadState::DomContentLoaded.to_string(), "DOMContentLoaded");
        }

        #[test]
        fn test_ready_state_mapping() {
            assert!(!LoadState::Load.is_reached_by("loading"));
            assert!(!LoadState::Load.is_reached_by("interactive"));
            assert!(LoadState::Load.is_reached_by("complete"));
            assert!(LoadState::DomContentLoaded.is_reached_by("interactive"));
            assert!(LoadState::DomContentLoaded.is_reached_by("complete"));
        }
    }

    mod poll_tests {
        use super::*;
        use std::sync::atomic::{AtomicU32, Ordering};

        #[tokio::test]
        async fn test_poll_until_succeeds_after_a_few_polls() {
            let calls = AtomicU32::new(0);
            let counter = &calls;
            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            poll_until("counter", &options, || async move {
                Ok::<_, A11yError>(counter.fetch_add(1, Ordering::SeqCst) >= 2)
            })
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_poll_until_times_out() {
            let options = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = poll_until("never", &options, || async { Ok::<_, A11yError>(false) })
                .await
                .unwrap_err();
            assert!(matches!(err, A11yError::Timeout { ref what, ms: 20 } if what == "never"));
        }

        #[tokio::test]
        async fn test_poll_until_returns_fatal_errors_at_once() {
            let calls = AtomicU32::new(0);
            let counter = &calls;
            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let err = poll_until("strict", &options, || async move {
                let _ = counter.fetch_add(1, Ordering::SeqCst);
                Err::<bool, _>(A11yError::StrictModeViolation {
                    locator: "role=searchbox".to_string(),
                    count: 2,
                })
            })
            .await
            .unwrap_err();
            assert!(matches!(err, A11yError::StrictModeViolation { count: 2, .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_poll_until_rides_out_transient_errors() {
            let calls = AtomicU32::new(0);
            let counter = &calls;
            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            poll_until("context", &options, || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Err(A11yError::page("Execution context was destroyed"));
                }
                Ok(true)
            })
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_poll_until_reports_last_transient_error_at_deadline() {
            let options = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = poll_until("gone", &options, || async {
                Err::<bool, _>(A11yError::page("Cannot find context with specified id"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, A11yError::Page { ref message } if message.contains("context")));
        }

        #[tokio::test]
        async fn test_poll_until_forgets_errors_after_a_clean_poll() {
            let calls = AtomicU32::new(0);
            let counter = &calls;
            let options = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = poll_until("settled", &options, || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(A11yError::page("Execution context was destroyed"));
                }
                Ok(false)
            })
            .await
            .unwrap_err();
            assert!(matches!(err, A11yError::Timeout { ref what, ms: 20 } if what == "settled"));
        }
    }

    mod ready_state_tests {
        use super::*;
        use crate::mock::MockPage;

        fn options() -> WaitOptions {
            WaitOptions::new().with_timeout(1_000).with_poll_interval(1)
        }

        #[tokio::test]
        async fn test_load_waits_for_complete() {
            let page = MockPage::new().with_ready_states(["loading", "interactive", "complete"]);
            wait_for_ready_state(&page, LoadState::Load, &options())
                .await
                .unwrap();
            assert_eq!(page.ready_state_polls(), 3);
        }

        #[tokio::test]
        async fn test_dom_content_loaded_stops_at_interactive() {
            let page = MockPage::new().with_ready_states(["loading", "interactive", "complete"]);
            wait_for_ready_state(&page, LoadState::DomContentLoaded, &options())
                .await
                .unwrap();
            assert_eq!(page.ready_state_polls(), 2);
        }

        #[tokio::test]
        async fn test_stuck_document_times_out() {
            let page = MockPage::new().with_ready_states(["loading", "interactive"]);
            let wait = WaitOptions::new().with_timeout(30).with_poll_interval(5);
            let err = wait_for_ready_state(&page, LoadState::Load, &wait)
                .await
                .unwrap_err();
            assert!(matches!(err, A11yError::Timeout { ref what, ms: 30 } if what == "load state 'load'"));
        }

        #[tokio::test]
        async fn test_context_loss_during_load_is_ridden_out() {
            let page = MockPage::new()
                .with_ready_states(["loading", "complete"])
                .with_context_loss(2);
            page.lose_context();
            wait_for_ready_state(&page, LoadState::Load, &options())
                .await
                .unwrap();
            assert_eq!(page.ready_state_polls(), 2);
        }
    }

    mod url_wait_tests {
        use super::*;
        use crate::mock::MockPage;

        #[tokio::test]
        async fn test_wait_for_url_survives_context_loss() {
            let page = MockPage::new().with_context_loss(1);
            page.goto("https://www.reddit.com/r/popular/").await.unwrap();
            page.lose_context();
            let wait = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            wait_for_url(&page, &UrlMatcher::new("/r/popular"), &wait)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_wait_for_url_times_out_on_wrong_page() {
            let page = MockPage::new();
            let wait = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = wait_for_url(&page, &UrlMatcher::new("/explore"), &wait)
                .await
                .unwrap_err();
            assert!(matches!(err, A11yError::Timeout { ref what, .. } if what == "URL matching '/explore'"));
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout(), Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS));
            assert_eq!(options.poll_interval(), Duration::from_millis(50));
        }
    }
}
