//! Suite configuration.
//!
//! Values come from [`SuiteConfig::default`], then an optional YAML file, then
//! environment overrides.

use crate::logging::LogFormat;
use crate::result::{A11yError, A11yResult};
use crate::scan::AxeSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application under test
pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Project label printed in every HTML report
pub const DEFAULT_PROJECT_KEY: &str = "Reddit Accessibility Testing";

/// Root directory for per-run output
pub const DEFAULT_RESULTS_DIR: &str = "test-results";

/// Directory for rendered HTML reports
pub const DEFAULT_REPORT_DIR: &str = "test-results/axe-core-reports";

/// Default action/navigation timeout (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "a11y.yaml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "A11Y_CONFIG";

/// Suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Root URL every test starts from
    pub base_url: String,
    /// Run Chromium headless
    pub headless: bool,
    /// Path to the Chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Locator auto-wait timeout
    pub action_timeout_ms: u64,
    /// Load-state and URL wait timeout
    pub navigation_timeout_ms: u64,
    /// Root for per-run output (attachments)
    pub results_dir: PathBuf,
    /// HTML report directory
    pub report_dir: PathBuf,
    /// Project label for reports
    pub project_key: String,
    /// Where the axe-core script comes from
    pub axe_source: AxeSource,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: true,
            chromium_path: None,
            sandbox: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: DEFAULT_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_TIMEOUT_MS,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            project_key: DEFAULT_PROJECT_KEY.to_string(),
            axe_source: AxeSource::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl SuiteConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `A11Y_CONFIG` or `a11y.yaml`, then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns error if a named config file is unreadable or malformed.
    pub fn load() -> A11yResult<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a YAML config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> A11yResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            A11yError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns error on malformed YAML.
    pub fn from_yaml(text: &str) -> A11yResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `A11Y_BASE_URL`, `A11Y_HEADLESS`, `CHROMIUM_PATH` and
    /// `A11Y_NO_SANDBOX` through the given lookup.
    ///
    /// # Errors
    ///
    /// Returns error on unparseable boolean values.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> A11yResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("A11Y_BASE_URL") {
            self.base_url = url;
        }
        if let Some(value) = lookup("A11Y_HEADLESS") {
            self.headless = parse_bool("A11Y_HEADLESS", &value)?;
        }
        if let Some(path) = lookup("CHROMIUM_PATH") {
            self.chromium_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("A11Y_NO_SANDBOX") {
            self.sandbox = !parse_bool("A11Y_NO_SANDBOX", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> A11yResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(A11yError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// URL of the application root
    #[must_use]
    pub fn root_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the action timeout
    #[must_use]
    pub const fn with_action_timeout(mut self, ms: u64) -> Self {
        self.action_timeout_ms = ms;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, ms: u64) -> Self {
        self.navigation_timeout_ms = ms;
        self
    }

    /// Set results and report directories under one root
    #[must_use]
    pub fn with_output_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.results_dir = root.to_path_buf();
        self.report_dir = root.join("axe-core-reports");
        self
    }

    /// Set the axe-core source
    #[must_use]
    pub fn with_axe_source(mut self, source: AxeSource) -> Self {
        self.axe_source = source;
        self
    }
}

fn parse_bool(key: &str, value: &str) -> A11yResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(A11yError::config(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}
