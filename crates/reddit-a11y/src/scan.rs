//! axe-core scanning.
//!
//! [`ScanFactory`] hands out [`AxeBuilder`]s bound to one page and restricted
//! to the WCAG 2.0/2.1 A and AA rule tags. A builder injects axe-core into the
//! page when `window.axe` is missing, runs it and parses the result.

use crate::browser::PageHandle;
use crate::result::{A11yError, A11yResult};
use crate::scan_result::AxeResults;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Rule tags every suite scan runs with
pub const WCAG_TAGS: [&str; 4] = ["wcag2a", "wcag2aa", "wcag21a", "wcag21aa"];

/// Pinned axe-core build fetched when no local copy is configured
pub const DEFAULT_AXE_URL: &str = "https://cdn.jsdelivr.net/npm/axe-core@4.10.2/axe.min.js";

const AXE_PRESENT_SCRIPT: &str =
    "/* a11y:axe-present */ typeof window.axe === 'object' && typeof window.axe.run === 'function'";

/// Where to load the axe-core script from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AxeSource {
    /// Download over HTTP(S) (needs the `browser` feature)
    Url {
        /// Script URL
        url: String,
    },
    /// Read from disk
    File {
        /// Script path
        path: PathBuf,
    },
}

impl Default for AxeSource {
    fn default() -> Self {
        Self::Url {
            url: DEFAULT_AXE_URL.to_string(),
        }
    }
}

impl std::fmt::Display for AxeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url { url } => f.write_str(url),
            Self::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// The axe-core source text, shared by every builder
#[derive(Debug, Clone)]
pub struct AxeScript(Arc<str>);

impl AxeScript {
    /// Wrap already-loaded source
    #[must_use]
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self(source.into())
    }

    /// Load the source once per test context
    ///
    /// # Errors
    ///
    /// Returns a scan error if the file cannot be read or the download fails
    pub async fn load(source: &AxeSource) -> A11yResult<Self> {
        let text = match source {
            AxeSource::File { path } => tokio::fs::read_to_string(path).await.map_err(|e| {
                A11yError::scan(format!("cannot read axe-core from {}: {e}", path.display()))
            })?,
            AxeSource::Url { url } => fetch(url).await?,
        };
        if text.trim().is_empty() {
            return Err(A11yError::scan(format!("axe-core source {source} is empty")));
        }
        tracing::debug!(%source, bytes = text.len(), "axe-core loaded");
        Ok(Self::new(text))
    }

    /// Source text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn inject_script(&self) -> String {
        format!(
            "/* a11y:axe-inject */ (() => {{\n{}\n;return typeof window.axe === 'object';\n}})()",
            self.0
        )
    }
}

#[cfg(feature = "browser")]
async fn fetch(url: &str) -> A11yResult<String> {
    let response = reqwest::get(url)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| A11yError::scan(format!("cannot download axe-core from {url}: {e}")))?;
    response
        .text()
        .await
        .map_err(|e| A11yError::scan(format!("cannot download axe-core from {url}: {e}")))
}

#[cfg(not(feature = "browser"))]
async fn fetch(url: &str) -> A11yResult<String> {
    Err(A11yError::config(format!(
        "downloading axe-core from {url} needs the `browser` feature; use a file source"
    )))
}

/// Configures and runs one axe-core scan
#[derive(Debug, Clone)]
pub struct AxeBuilder {
    page: PageHandle,
    script: AxeScript,
    tags: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    disabled_rules: Vec<String>,
}

impl AxeBuilder {
    /// Scan the whole page with every rule
    #[must_use]
    pub fn new(page: &PageHandle, script: AxeScript) -> Self {
        Self {
            page: PageHandle::clone(page),
            script,
            tags: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            disabled_rules: Vec::new(),
        }
    }

    /// Only run rules carrying one of these tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the scan to elements matching `selector`
    #[must_use]
    pub fn include(mut self, selector: impl Into<String>) -> Self {
        self.include.push(selector.into());
        self
    }

    /// Skip elements matching `selector`
    #[must_use]
    pub fn exclude(mut self, selector: impl Into<String>) -> Self {
        self.exclude.push(selector.into());
        self
    }

    /// Turn off rules by id
    #[must_use]
    pub fn disable_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_rules.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Tags the scan is restricted to
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    fn context(&self) -> String {
        if self.include.is_empty() && self.exclude.is_empty() {
            return "document".to_string();
        }
        let mut context = Map::new();
        if !self.include.is_empty() {
            let _ = context.insert("include".to_string(), json!(self.include));
        }
        if !self.exclude.is_empty() {
            let _ = context.insert("exclude".to_string(), json!(self.exclude));
        }
        Value::Object(context).to_string()
    }

    fn options(&self) -> Value {
        let mut options = Map::new();
        if !self.tags.is_empty() {
            let _ = options.insert(
                "runOnly".to_string(),
                json!({ "type": "tag", "values": self.tags }),
            );
        }
        if !self.disabled_rules.is_empty() {
            let rules: Map<String, Value> = self
                .disabled_rules
                .iter()
                .map(|id| (id.clone(), json!({ "enabled": false })))
                .collect();
            let _ = options.insert("rules".to_string(), Value::Object(rules));
        }
        Value::Object(options)
    }

    fn run_script(&self) -> String {
        format!(
            "/* a11y:axe-run */ window.axe.run({}, {}).then((r) => JSON.stringify(r))",
            self.context(),
            self.options()
        )
    }

    /// Run the scan
    ///
    /// # Errors
    ///
    /// Returns a scan error if axe-core cannot be injected, throws, or
    /// returns something other than a result object
    pub async fn analyze(&self) -> A11yResult<AxeResults> {
        let loaded = self.page.evaluate(AXE_PRESENT_SCRIPT).await?;
        if loaded.as_bool() != Some(true) {
            let injected = self
                .page
                .evaluate(&self.script.inject_script())
                .await
                .map_err(|e| A11yError::scan(format!("injecting axe-core failed: {e}")))?;
            if injected.as_bool() != Some(true) {
                return Err(A11yError::scan("axe-core did not register window.axe"));
            }
            tracing::debug!("axe-core injected");
        }

        let raw = self
            .page
            .evaluate(&self.run_script())
            .await
            .map_err(|e| A11yError::scan(format!("axe.run failed: {e}")))?;
        let json = raw
            .as_str()
            .ok_or_else(|| A11yError::scan("axe.run returned no result"))?;
        let results = AxeResults::from_json(json)?;

        let summary = results.summary();
        tracing::info!(
            url = %results.url,
            violations = summary.violations,
            passes = summary.passes,
            incomplete = summary.incomplete,
            "accessibility scan complete"
        );
        Ok(results)
    }
}

/// Makes tag-filtered builders for one page
#[derive(Debug, Clone)]
pub struct ScanFactory {
    page: PageHandle,
    script: AxeScript,
}

impl ScanFactory {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: &PageHandle, script: AxeScript) -> Self {
        Self {
            page: PageHandle::clone(page),
            script,
        }
    }

    /// Fresh builder restricted to [`WCAG_TAGS`]
    #[must_use]
    pub fn make_axe_builder(&self) -> AxeBuilder {
        AxeBuilder::new(&self.page, self.script.clone()).with_tags(WCAG_TAGS)
    }
}
