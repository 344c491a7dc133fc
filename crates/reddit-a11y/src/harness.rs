//! Per-test setup and teardown.
//!
//! A [`TestContext`] is built in a fixed order: page, navigation to the site
//! root with a load wait, page models, then the scan factory and the
//! artifact sink. Every test owns its context; nothing is shared.

use crate::attachment::{self, Attachment, TestRun};
use crate::browser::PageHandle;
use crate::config::SuiteConfig;
use crate::locator::LocatorOptions;
use crate::pages::{ExplorePage, HomePage, PopularPage};
use crate::report;
use crate::result::A11yResult;
use crate::scan::{AxeBuilder, AxeScript, ScanFactory};
use crate::scan_result::AxeResults;
use crate::wait::{LoadState, WaitOptions};
use std::path::PathBuf;

#[cfg(feature = "browser")]
use crate::browser::{BrowserConfig, ChromiumBrowser};

/// Everything one test works with
#[derive(Debug)]
pub struct TestContext {
    config: SuiteConfig,
    page: PageHandle,
    /// Home page model
    pub home_page: HomePage,
    /// Popular page model
    pub popular_page: PopularPage,
    /// Explore page model
    pub explore_page: ExplorePage,
    scans: ScanFactory,
    run: TestRun,
    #[cfg(feature = "browser")]
    browser: Option<ChromiumBrowser>,
}

impl TestContext {
    /// Launch Chromium, open a page and set up the context on it
    ///
    /// # Errors
    ///
    /// Returns error if axe-core cannot be loaded, Chromium cannot start or
    /// the site root does not load
    #[cfg(feature = "browser")]
    pub async fn launch(title: &str, config: SuiteConfig) -> A11yResult<Self> {
        let _ = crate::logging::init_tracing(config.log_format);
        let axe = AxeScript::load(&config.axe_source).await?;
        let browser = ChromiumBrowser::launch(BrowserConfig::from(&config)).await?;

        let page: PageHandle = match browser.new_page().await {
            Ok(page) => std::sync::Arc::new(page),
            Err(e) => {
                let _ = browser.close().await;
                return Err(e);
            }
        };

        match Self::setup(page, title, config, axe).await {
            Ok(mut context) => {
                context.browser = Some(browser);
                Ok(context)
            }
            Err(e) => {
                let _ = browser.close().await;
                Err(e)
            }
        }
    }

    /// Set up a context on an already-open page
    ///
    /// # Errors
    ///
    /// Returns error if navigation to the site root or the load wait fails
    pub async fn setup(
        page: PageHandle,
        title: &str,
        config: SuiteConfig,
        axe: AxeScript,
    ) -> A11yResult<Self> {
        let root = config.root_url();
        tracing::info!(test = title, url = %root, "setting up test context");

        page.goto(&root).await?;
        page.wait_for_load_state(LoadState::Load, &navigation_wait(&config))
            .await?;

        let options = LocatorOptions::from(&config);
        let home_page = HomePage::with_options(&page, options.clone());
        let popular_page = PopularPage::with_options(&page, options.clone());
        let explore_page = ExplorePage::with_options(&page, options);

        let scans = ScanFactory::new(&page, axe);
        let run = TestRun::new(title, &config.results_dir);

        Ok(Self {
            config,
            page,
            home_page,
            popular_page,
            explore_page,
            scans,
            run,
            #[cfg(feature = "browser")]
            browser: None,
        })
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// The test's page
    #[must_use]
    pub const fn page(&self) -> &PageHandle {
        &self.page
    }

    /// The test's artifact sink
    #[must_use]
    pub const fn run(&self) -> &TestRun {
        &self.run
    }

    /// Wait options bounded by the navigation timeout
    #[must_use]
    pub fn navigation_wait(&self) -> WaitOptions {
        navigation_wait(&self.config)
    }

    /// Fresh scan builder restricted to the WCAG A/AA tags
    #[must_use]
    pub fn make_axe_builder(&self) -> AxeBuilder {
        self.scans.make_axe_builder()
    }

    /// Write `accessibility-report-<page_name>.html` to the report directory
    ///
    /// # Errors
    ///
    /// Returns error if the report cannot be written
    pub fn create_axe_report(&self, results: &AxeResults, page_name: &str) -> A11yResult<PathBuf> {
        report::create_axe_report(results, page_name, &self.config)
    }

    /// Attach the raw scan result to this test
    ///
    /// # Errors
    ///
    /// Returns error if the attachment cannot be written
    pub async fn attach_accessibility_results(
        &self,
        results: &AxeResults,
    ) -> A11yResult<Attachment> {
        attachment::attach_accessibility_results(results, &self.run).await
    }

    /// Close the page, then the browser if this context launched one
    ///
    /// # Errors
    ///
    /// Returns the first close failure; the browser is closed regardless
    pub async fn teardown(self) -> A11yResult<()> {
        let closed = self.page.close().await;
        #[cfg(feature = "browser")]
        if let Some(browser) = self.browser {
            browser.close().await?;
        }
        tracing::info!(test = self.run.title(), "test context torn down");
        closed
    }
}

fn navigation_wait(config: &SuiteConfig) -> WaitOptions {
    WaitOptions::new().with_timeout(config.navigation_timeout_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, PageAction};
    use std::sync::Arc;

    fn config(root: &std::path::Path) -> SuiteConfig {
        SuiteConfig::default()
            .with_base_url("https://www.reddit.com")
            .with_output_root(root)
            .with_action_timeout(50)
    }

    #[tokio::test]
    async fn test_setup_navigates_then_waits() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockPage::new());
        let context = TestContext::setup(
            mock.clone(),
            "home page",
            config(dir.path()),
            AxeScript::new("window.axe = {};"),
        )
        .await
        .unwrap();

        assert_eq!(
            mock.actions(),
            vec![
                PageAction::Goto("https://www.reddit.com/".to_string()),
                PageAction::WaitForLoad(LoadState::Load),
            ]
        );
        assert_eq!(context.run().output_dir(), dir.path().join("home-page"));
        assert_eq!(
            context.home_page.logo.options().timeout,
            std::time::Duration::from_millis(50)
        );
        assert_eq!(context.make_axe_builder().tags().len(), 4);
    }

    #[tokio::test]
    async fn test_teardown_closes_page() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockPage::new());
        let context = TestContext::setup(
            mock.clone(),
            "t",
            config(dir.path()),
            AxeScript::new("window.axe = {};"),
        )
        .await
        .unwrap();
        context.teardown().await.unwrap();
        assert_eq!(mock.actions().last(), Some(&PageAction::Close));
    }

    #[tokio::test]
    async fn test_helpers_write_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockPage::new());
        let context = TestContext::setup(
            mock.clone(),
            "explore",
            config(dir.path()),
            AxeScript::new("window.axe = {};"),
        )
        .await
        .unwrap();
        let results = context.make_axe_builder().analyze().await.unwrap();
        let attachment = context.attach_accessibility_results(&results).await.unwrap();
        let report = context.create_axe_report(&results, "reddit-explore-page").unwrap();
        assert!(attachment.path.exists());
        assert!(report.ends_with("axe-core-reports/accessibility-report-reddit-explore-page.html"));
    }
}
