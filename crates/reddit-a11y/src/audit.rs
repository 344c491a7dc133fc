//! The accessibility audit each test runs.

use crate::harness::TestContext;
use crate::page_object::{PageObject, UrlMatcher};
use crate::result::A11yResult;
use crate::scan_result::AxeResults;
use crate::wait::{wait_for_url, LoadState};

/// A page the suite audits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditTarget {
    /// Site root
    Home,
    /// Popular feed, reached from the home page
    Popular,
    /// Explore, reached from the home page
    Explore,
}

impl AuditTarget {
    /// Every audited page
    pub const ALL: [Self; 3] = [Self::Home, Self::Popular, Self::Explore];

    /// Identifier used in report file names
    #[must_use]
    pub const fn page_identifier(&self) -> &'static str {
        match self {
            Self::Home => "reddit-home-page",
            Self::Popular => "reddit-popular-page",
            Self::Explore => "reddit-explore-page",
        }
    }

    /// Matcher for URLs of this page
    #[must_use]
    pub fn url_matcher(&self, context: &TestContext) -> UrlMatcher {
        match self {
            Self::Home => context.home_page.url_matcher(),
            Self::Popular => context.popular_page.url_matcher(),
            Self::Explore => context.explore_page.url_matcher(),
        }
    }

    /// Click through to this page from wherever the browser is
    ///
    /// # Errors
    ///
    /// Returns error if the link cannot be resolved or clicked
    pub async fn navigate(&self, context: &TestContext) -> A11yResult<()> {
        match self {
            Self::Home => context.home_page.click_logo().await,
            Self::Popular => context.home_page.click_popular_button().await,
            Self::Explore => context.home_page.click_explore_button().await,
        }
    }
}

impl std::fmt::Display for AuditTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.page_identifier())
    }
}

/// Reach `target`, wait for it to load, scan it, attach the raw result and
/// write its HTML report.
///
/// Artifacts are written whatever the scan found; asserting on the returned
/// result is left to the caller.
///
/// # Errors
///
/// Returns the first navigation, wait, scan or artifact failure
pub async fn audit_page(context: &TestContext, target: AuditTarget) -> A11yResult<AxeResults> {
    let page = context.page();
    let wait = context.navigation_wait();
    let matcher = target.url_matcher(context);

    if !matcher.matches_url(&page.url().await?) {
        tracing::info!(%target, "navigating");
        target.navigate(context).await?;
        wait_for_url(&**page, &matcher, &wait).await?;
    }
    page.wait_for_load_state(LoadState::Load, &wait).await?;

    let results = context.make_axe_builder().analyze().await?;
    let _ = context.attach_accessibility_results(&results).await?;
    let report = context.create_axe_report(&results, target.page_identifier())?;

    tracing::info!(
        %target,
        violations = results.violations.len(),
        report = %report.display(),
        "audit finished"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_identifiers() {
        let ids: Vec<_> = AuditTarget::ALL.iter().map(AuditTarget::page_identifier).collect();
        assert_eq!(ids, ["reddit-home-page", "reddit-popular-page", "reddit-explore-page"]);
        assert_eq!(AuditTarget::Popular.to_string(), "reddit-popular-page");
    }
}
