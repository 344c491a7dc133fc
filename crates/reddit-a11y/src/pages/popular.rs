//! Popular feed (`/r/popular`).

use super::{logo, search_input, submit_search};
use crate::browser::PageHandle;
use crate::locator::{Locator, LocatorOptions};
use crate::page_object::PageObject;
use crate::result::A11yResult;

/// The Popular feed
#[derive(Debug, Clone)]
pub struct PopularPage {
    /// Site logo
    pub logo: Locator,
    /// Search field
    pub search_input: Locator,
}

impl PopularPage {
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

impl PageObject for PopularPage {
    fn url_pattern(&self) -> &str {
        "/r/popular"
    }

    fn page_name(&self) -> &str {
        "popular"
    }
}
