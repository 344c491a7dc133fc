//! Result and error types for the accessibility suite.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for suite operations
pub type A11yResult<T> = Result<T, A11yError>;

/// Errors that can occur while driving the browser, scanning or reporting.
///
/// Every variant is terminal for the test that produced it.
#[derive(Debug, Error)]
pub enum A11yError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched a locator before its timeout
    #[error("No element matched {locator} within {timeout_ms}ms")]
    ElementNotFound {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// More than one element matched a strict locator
    #[error("Strict mode violation: {locator} resolved to {count} elements")]
    StrictModeViolation {
        /// Locator description
        locator: String,
        /// Number of matches
        count: usize,
    },

    /// A click/fill/press failed in the browser
    #[error("{action} on {locator} failed: {message}")]
    Interaction {
        /// Locator description
        locator: String,
        /// Action name
        action: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Accessibility engine failure
    #[error("Accessibility scan failed: {message}")]
    Scan {
        /// Error message
        message: String,
    },

    /// Report could not be written
    #[error("Failed to write report {}: {source}", path.display())]
    Report {
        /// Report path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Attachment could not be stored
    #[error("Failed to attach {name}: {message}")]
    Attachment {
        /// Attachment name
        name: String,
        /// Error message
        message: String,
    },

    /// The scan found violations
    #[error("Expected no accessibility violations, found {count}:\n{details}")]
    ViolationsFound {
        /// Number of violated rules
        count: usize,
        /// Rendered violation details
        details: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl A11yError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a scan error
    #[must_use]
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a wait condition that failed with this error may still hold on
    /// a later poll.
    ///
    /// Evaluation against a document that is being replaced fails with a page
    /// error ("Execution context was destroyed", "Cannot find context").
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Page { .. })
    }

    /// Create an interaction error
    #[must_use]
    pub fn interaction(
        locator: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Interaction {
            locator: locator.into(),
            action: action.into(),
            message: message.into(),
        }
    }
}
