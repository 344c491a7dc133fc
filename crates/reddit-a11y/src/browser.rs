//! Browser control for the accessibility suite.
//!
//! [`BrowserPage`] is the boundary every other module talks to. With the
//! `browser` feature enabled, [`ChromiumBrowser`] launches Chromium and hands
//! out [`CdpPage`]s driven over the Chrome `DevTools` Protocol via
//! chromiumoxide. Without it, tests drive [`crate::mock::MockPage`].

use crate::config::SuiteConfig;
use crate::result::A11yResult;
use crate::wait::{LoadState, WaitOptions};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// A live browser page.
///
/// Element lookup is not part of this boundary: the locator layer resolves
/// elements with [`evaluate`](Self::evaluate), focuses them or computes their
/// click point, then uses the trusted input primitives below.
#[async_trait]
pub trait BrowserPage: Send + Sync + std::fmt::Debug {
    /// Navigate to a URL
    async fn goto(&self, url: &str) -> A11yResult<()>;

    /// Wait until the page reaches `state`
    async fn wait_for_load_state(&self, state: LoadState, options: &WaitOptions)
        -> A11yResult<()>;

    /// Evaluate a JavaScript expression, awaiting promises, and return its
    /// JSON value (`null` for `undefined`)
    async fn evaluate(&self, expression: &str) -> A11yResult<serde_json::Value>;

    /// Left-click at viewport coordinates
    async fn click_at(&self, x: f64, y: f64) -> A11yResult<()>;

    /// Insert text into the focused element
    async fn insert_text(&self, text: &str) -> A11yResult<()>;

    /// Press and release a key (e.g. `Enter`) on the focused element
    async fn press_key(&self, key: &str) -> A11yResult<()>;

    /// Current document URL
    async fn url(&self) -> A11yResult<String>;

    /// Close the page
    async fn close(&self) -> A11yResult<()>;
}

/// Shared handle to a page; page models and builders each hold a clone
pub type PageHandle = Arc<dyn BrowserPage>;

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// CDP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::from(&SuiteConfig::default())
    }
}

impl From<&SuiteConfig> for BrowserConfig {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            chromium_path: config.chromium_path.clone(),
            sandbox: config.sandbox,
            request_timeout_ms: config.navigation_timeout_ms,
        }
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::{async_trait, A11yResult, BrowserConfig, BrowserPage, LoadState, WaitOptions};
    use crate::result::A11yError;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use super::KeySpec;
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, InsertTextParams, MouseButton,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpInnerPage;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    /// Chromium process with its CDP event loop
    #[derive(Debug)]
    pub struct ChromiumBrowser {
        config: BrowserConfig,
        inner: CdpBrowser,
        handler: JoinHandle<()>,
    }

    impl ChromiumBrowser {
        /// Launch Chromium
        ///
        /// # Errors
        ///
        /// Returns error if the binary cannot be found or started
        pub async fn launch(config: BrowserConfig) -> A11yResult<Self> {
            let cdp_config = cdp_config(&config)?;

            let (inner, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| A11yError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(headless = config.headless, "chromium launched");
            Ok(Self {
                config,
                inner,
                handler,
            })
        }

        /// Open a fresh blank page
        ///
        /// # Errors
        ///
        /// Returns error if the target cannot be created
        pub async fn new_page(&self) -> A11yResult<CdpPage> {
            let inner = self
                .inner
                .new_page("about:blank")
                .await
                .map_err(|e| A11yError::page(e.to_string()))?;
            Ok(CdpPage { inner })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser and stop its event loop
        ///
        /// # Errors
        ///
        /// Returns error if Chromium refuses to close
        pub async fn close(mut self) -> A11yResult<()> {
            let closed = self
                .inner
                .close()
                .await
                .map_err(|e| A11yError::BrowserLaunch {
                    message: e.to_string(),
                });
            let _ = self.inner.wait().await;
            self.handler.abort();
            closed.map(|_| ())
        }
    }

    /// Page emulation matching the configured window; chromiumoxide would
    /// otherwise emulate 800x600 on every page
    fn viewport(config: &BrowserConfig) -> Viewport {
        Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            ..Viewport::default()
        }
    }

    fn cdp_config(config: &BrowserConfig) -> A11yResult<CdpConfig> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(viewport(config))
            .request_timeout(Duration::from_millis(config.request_timeout_ms));

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|message| A11yError::BrowserLaunch { message })
    }

    /// A browser page with a real CDP connection
    #[derive(Debug, Clone)]
    pub struct CdpPage {
        inner: CdpInnerPage,
    }

    impl CdpPage {
        async fn mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> A11yResult<()> {
            let mut builder = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
            if kind != DispatchMouseEventType::MouseMoved {
                builder = builder.button(MouseButton::Left).click_count(1);
            }
            let params = builder
                .build()
                .map_err(|message| A11yError::interaction("mouse", "click", message))?;
            self.inner
                .execute(params)
                .await
                .map_err(|e| A11yError::interaction("mouse", "click", e.to_string()))?;
            Ok(())
        }

        async fn key(&self, kind: DispatchKeyEventType, key: &KeySpec) -> A11yResult<()> {
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(kind.clone())
                .key(key.key.clone())
                .code(key.code.clone())
                .windows_virtual_key_code(key.key_code)
                .native_virtual_key_code(key.key_code);
            if kind == DispatchKeyEventType::KeyDown {
                if let Some(ref text) = key.text {
                    builder = builder.text(text.clone());
                }
            }
            let params = builder
                .build()
                .map_err(|message| A11yError::interaction("keyboard", "press", message))?;
            self.inner
                .execute(params)
                .await
                .map_err(|e| A11yError::interaction("keyboard", "press", e.to_string()))?;
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserPage for CdpPage {
        async fn goto(&self, url: &str) -> A11yResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| A11yError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn wait_for_load_state(
            &self,
            state: LoadState,
            options: &WaitOptions,
        ) -> A11yResult<()> {
            crate::wait::wait_for_ready_state(self, state, options).await
        }

        async fn evaluate(&self, expression: &str) -> A11yResult<serde_json::Value> {
            let params = EvaluateParams::builder()
                .expression(expression)
                .await_promise(true)
                .return_by_value(true)
                .build()
                .map_err(A11yError::page)?;
            let result = self
                .inner
                .evaluate_expression(params)
                .await
                .map_err(|e| A11yError::page(e.to_string()))?;
            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        }

        async fn click_at(&self, x: f64, y: f64) -> A11yResult<()> {
            self.mouse(DispatchMouseEventType::MouseMoved, x, y).await?;
            self.mouse(DispatchMouseEventType::MousePressed, x, y).await?;
            self.mouse(DispatchMouseEventType::MouseReleased, x, y).await
        }

        async fn insert_text(&self, text: &str) -> A11yResult<()> {
            self.inner
                .execute(InsertTextParams::new(text))
                .await
                .map_err(|e| A11yError::interaction("keyboard", "insert text", e.to_string()))?;
            Ok(())
        }

        async fn press_key(&self, key: &str) -> A11yResult<()> {
            let chord = KeySpec::parse(key)?;
            self.key(DispatchKeyEventType::KeyDown, &chord).await?;
            self.key(DispatchKeyEventType::KeyUp, &chord).await
        }

        async fn url(&self) -> A11yResult<String> {
            // location.href follows history.pushState, the CDP target URL may not
            let href = self.evaluate("/* a11y:href */ location.href").await?;
            href.as_str()
                .map(str::to_string)
                .ok_or_else(|| A11yError::page("location.href is not a string"))
        }

        async fn close(&self) -> A11yResult<()> {
            self.inner
                .clone()
                .close()
                .await
                .map_err(|e| A11yError::page(e.to_string()))
        }
    }

}

/// CDP key event fields for one key name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    /// DOM `key` value
    pub key: String,
    /// DOM `code` value
    pub code: String,
    /// Windows virtual key code
    pub key_code: i64,
    /// Text inserted on key down, if any
    pub text: Option<String>,
}

impl KeySpec {
    /// Look up a named key (`Enter`, `Tab`, `Escape`, ...) or a single
    /// printable character.
    ///
    /// # Errors
    ///
    /// Returns an interaction error for unknown key names.
    pub fn parse(key: &str) -> A11yResult<Self> {
        let named = |code: &str, key_code: i64, text: Option<&str>| Self {
            key: key.to_string(),
            code: code.to_string(),
            key_code,
            text: text.map(str::to_string),
        };
        let parsed = match key {
            "Enter" => named("Enter", 13, Some("\r")),
            "Tab" => named("Tab", 9, None),
            "Escape" => named("Escape", 27, None),
            "Backspace" => named("Backspace", 8, None),
            "Delete" => named("Delete", 46, None),
            "Space" | " " => Self {
                key: " ".to_string(),
                code: "Space".to_string(),
                key_code: 32,
                text: Some(" ".to_string()),
            },
            "ArrowUp" => named("ArrowUp", 38, None),
            "ArrowDown" => named("ArrowDown", 40, None),
            "ArrowLeft" => named("ArrowLeft", 37, None),
            "ArrowRight" => named("ArrowRight", 39, None),
            "Home" => named("Home", 36, None),
            "End" => named("End", 35, None),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => {
                        let upper = c.to_ascii_uppercase();
                        let code = if c.is_ascii_digit() {
                            format!("Digit{c}")
                        } else {
                            format!("Key{upper}")
                        };
                        Self {
                            key: c.to_string(),
                            code,
                            key_code: i64::from(u32::from(upper)),
                            text: Some(c.to_string()),
                        }
                    }
                    _ => {
                        return Err(crate::result::A11yError::interaction(
                            "keyboard",
                            format!("press {other}"),
                            "unknown key name",
                        ))
                    }
                }
            }
        };
        Ok(parsed)
    }
}

#[cfg(feature = "browser")]
pub use cdp::{CdpPage, ChromiumBrowser};
