//! Explore page (`/explore`).

use super::{logo, search_input, submit_search};
use crate::browser::PageHandle;
use crate::locator::{Locator, LocatorOptions};
use crate::page_object::PageObject;
use crate::result::A11yResult;

/// The Explore page
#[derive(Debug, Clone)]
pub struct ExplorePage {
    /// Site logo
    pub logo: Locator,
    /// Search field
    pub search_input: Locator,
}

impl ExplorePage {
    /// Bind the page model to `page` with default locator options
    #[must_use]
    pub fn new(page: &PageHandle) -> Self {
        Self::with_options(page, LocatorOptions::default())
    }

    /// Bind the page model to `page`
    #[must_use]
    pub fn with_options(page: &PageHandle, options: LocatorOptions) -> Self {
        Self {
            logo: logo(page, &options),
            search_input: search_input(page, &options),
        }
    }

    /// Click the site logo
    ///
    /// # Errors
    ///
    /// Returns error if the logo cannot be resolved or clicked
    pub async fn click_logo(&self) -> A11yResult<()> {
        self.logo.click().await
    }

    /// Search for `query`
    ///
    /// # Errors
    ///
    /// Returns error if the search field cannot be resolved or typed into
    pub async fn search(&self, query: &str) -> A11yResult<()> {
        submit_search(&self.search_input, query).await
    }
}

impl PageObject for ExplorePage {
    fn url_pattern(&self) -> &str {
        "/explore"
    }

    fn page_name(&self) -> &str {
        "explore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, PageAction};
    use crate::result::A11yError;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_matches_explore_urls() {
        let page: PageHandle = Arc::new(MockPage::new());
        let explore = ExplorePage::new(&page);
        assert!(explore.url_matcher().matches_url("https://www.reddit.com/explore/?feed=home"));
        assert!(!explore.url_matcher().matches_url("https://www.reddit.com/"));
    }

    #[tokio::test]
    async fn test_search_submits_with_enter() {
        let mock = Arc::new(MockPage::new());
        let page: PageHandle = mock.clone();
        ExplorePage::new(&page).search("rust").await.unwrap();
        assert_eq!(
            mock.actions().last(),
            Some(&PageAction::Press("role=searchbox".to_string(), "Enter".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_search_field_is_reported() {
        let mock = Arc::new(MockPage::new().with_match_count("role=searchbox", 0));
        let page: PageHandle = mock.clone();
        let options = LocatorOptions {
            timeout: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
            strict: true,
        };
        let err = ExplorePage::with_options(&page, options)
            .search("rust")
            .await
            .unwrap_err();
        assert!(matches!(err, A11yError::ElementNotFound { .. }));
    }
}
