//! Home page (`/`).

use super::{logo, search_input, submit_search};
use crate::browser::PageHandle;
use crate::locator::{AriaRole, Locator, LocatorOptions, PageLocators};
use crate::page_object::PageObject;
use crate::result::A11yResult;

/// The front page, with links to the Popular, All and Explore feeds
#[derive(Debug, Clone)]
pub struct HomePage {
    /// Site logo
    pub logo: Locator,
    /// Search field
    pub search_input: Locator,
    /// "Popular" feed link
    pub popular_button: Locator,
    /// "All" feed link
    pub all_button: Locator,
    /// "Explore" link
    pub explore_button: Locator,
}

impl HomePage {
    /// Bind the page model to `page` with default locator options
    #[must_use]
    pub fn new(page: &PageHandle) -> Self {
        Self::with_options(page, LocatorOptions::default())
    }

    /// Bind the page model to `page`
    #[must_use]
    pub fn with_options(page: &PageHandle, options: LocatorOptions) -> Self {
        let link = |name: &str| {
            page.get_by_role(AriaRole::Link)
                .with_name(name)
                .with_options(options.clone())
        };
        Self {
            logo: logo(page, &options),
            search_input: search_input(page, &options),
            popular_button: link("Popular"),
            all_button: link("All"),
            explore_button: link("Explore"),
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

    /// Open the Popular feed
    ///
    /// # Errors
    ///
    /// Returns error if the link cannot be resolved or clicked
    pub async fn click_popular_button(&self) -> A11yResult<()> {
        self.popular_button.click().await
    }

    /// Open the All feed
    ///
    /// # Errors
    ///
    /// Returns error if the link cannot be resolved or clicked
    pub async fn click_all_button(&self) -> A11yResult<()> {
        self.all_button.click().await
    }

    /// Open Explore
    ///
    /// # Errors
    ///
    /// Returns error if the link cannot be resolved or clicked
    pub async fn click_explore_button(&self) -> A11yResult<()> {
        self.explore_button.click().await
    }
}

impl PageObject for HomePage {
    fn url_pattern(&self) -> &str {
        "/"
    }

    fn page_name(&self) -> &str {
        "home"
    }
}
