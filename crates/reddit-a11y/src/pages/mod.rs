//! Page models for the three audited screens.
//!
//! Each model binds role- and label-based [`Locator`](crate::Locator)s to a
//! live page at construction and exposes the interactions the tests perform.
//! Models hold no state beyond those locators.

mod explore;
mod home;
mod popular;

pub use explore::ExplorePage;
pub use home::HomePage;
pub use popular::PopularPage;

use crate::browser::PageHandle;
use crate::locator::{AriaRole, Locator, LocatorOptions, PageLocators};
use crate::result::A11yResult;

/// Site logo, labelled "Home" on every page
fn logo(page: &PageHandle, options: &LocatorOptions) -> Locator {
    page.get_by_label("Home").with_options(options.clone())
}

/// Global search field
fn search_input(page: &PageHandle, options: &LocatorOptions) -> Locator {
    page.get_by_role(AriaRole::Searchbox)
        .with_options(options.clone())
}

/// Fill the search field and submit with Enter
async fn submit_search(search_input: &Locator, query: &str) -> A11yResult<()> {
    search_input.fill(query).await?;
    search_input.press("Enter").await
}
