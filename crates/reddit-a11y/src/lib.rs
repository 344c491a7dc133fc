//! reddit-a11y: WCAG accessibility audits of Reddit's front pages
//!
//! Drives Chromium over the Chrome `DevTools` Protocol, navigates between the
//! home, popular and explore pages through role- and label-based page models,
//! runs axe-core restricted to the WCAG 2.0/2.1 A and AA rules, and writes the
//! raw result as a JSON attachment plus an HTML report per page.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    reddit-a11y Architecture                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Test       │    │ Page       │    │ Chromium   │            │
//! │   │ Context    │───►│ Models +   │───►│ (CDP) or   │            │
//! │   │            │    │ Locators   │    │ MockPage   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                                   ▲                   │
//! │         ▼                                   │                   │
//! │   ┌────────────┐    ┌────────────┐          │                   │
//! │   │ Scan       │───►│ axe-core   │──────────┘                   │
//! │   │ Factory    │    │ results    │───► JSON attachment          │
//! │   └────────────┘    └────────────┘───► HTML report              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "browser")]
//! # async fn run() -> reddit_a11y::A11yResult<()> {
//! use reddit_a11y::{audit_page, AuditTarget, SuiteConfig, TestContext};
//!
//! let context = TestContext::launch("home page audit", SuiteConfig::load()?).await?;
//! let results = audit_page(&context, AuditTarget::Home).await;
//! context.teardown().await?;
//! results?.ensure_no_violations()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod attachment;
mod audit;
mod browser;
mod config;
mod harness;
mod locator;
mod page_object;
mod report;
mod result;
mod scan;
mod scan_result;

/// Tracing subscriber setup
pub mod logging;

/// Scripted in-memory page for tests without a browser
///
/// Records every interaction so tests can assert on order and targets.
pub mod mock;

/// Home, Popular and Explore page models
pub mod pages;

/// Load-state and URL waits
pub mod wait;

pub use attachment::{
    attach_accessibility_results, Attachment, AttachmentBody, ContentType, TestRun,
    SCAN_RESULTS_ATTACHMENT,
};
pub use audit::{audit_page, AuditTarget};
pub use browser::{BrowserConfig, BrowserPage, KeySpec, PageHandle};
#[cfg(feature = "browser")]
pub use browser::{CdpPage, ChromiumBrowser};
pub use config::{SuiteConfig, CONFIG_ENV, DEFAULT_BASE_URL, DEFAULT_PROJECT_KEY};
pub use harness::TestContext;
pub use locator::{AriaRole, Locator, LocatorOptions, PageLocators, Selector};
pub use page_object::{url_path, PageObject, UrlMatcher};
pub use pages::{ExplorePage, HomePage, PopularPage};
pub use report::{
    create_axe_report, create_html_report, render_html, report_file_name, ReportOptions,
};
pub use result::{A11yError, A11yResult};
pub use scan::{AxeBuilder, AxeScript, AxeSource, ScanFactory, DEFAULT_AXE_URL, WCAG_TAGS};
pub use scan_result::{
    AxeResults, CheckResult, Impact, NodeResult, RuleResult, ScanSummary, TestEngine,
    TestEnvironment,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        audit_page, A11yError, A11yResult, AriaRole, AuditTarget, AxeResults, HomePage,
        PageLocators, PageObject, SuiteConfig, TestContext,
    };
    pub use super::{ExplorePage, PopularPage};
}
