//! Page Object Model support.
//!
//! A page object is a struct of [`Locator`](crate::Locator)s bound to one
//! live page plus async methods for the interactions the tests need.

/// Trait for page objects representing one navigable screen.
pub trait PageObject {
    /// URL path pattern that matches this page (e.g. `/`, `/r/popular`)
    fn url_pattern(&self) -> &str;

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Matcher for [`url_pattern`](Self::url_pattern)
    fn url_matcher(&self) -> UrlMatcher {
        UrlMatcher::new(self.url_pattern())
    }
}

/// URL path matcher for page objects.
///
/// Segments compare literally; empty segments are ignored, so a trailing
/// slash makes no difference.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<String>,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl UrlMatcher {
    /// Create a new URL matcher from a path such as `/r/popular`
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            segments: segments(pattern).map(str::to_string).collect(),
        }
    }

    /// Check if a path matches the pattern
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        segments(path).eq(self.segments.iter().map(String::as_str))
    }

    /// Check if an absolute URL's path matches the pattern
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        self.matches(url_path(url))
    }

    /// Get the original pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Path component of an absolute URL, without query or fragment.
///
/// Relative input is treated as a path already.
#[must_use]
pub fn url_path(url: &str) -> &str {
    let after_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => url,
    };
    let end = after_scheme
        .find(['?', '#'])
        .unwrap_or(after_scheme.len());
    &after_scheme[..end]
}
