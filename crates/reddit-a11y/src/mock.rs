//! Scripted in-memory page for driving the suite without Chromium.
//!
//! [`MockPage`] answers the scripts the locator, wait and scan layers send
//! (recognised by their leading `/* a11y:<tag> */` comment) and records every
//! interaction as a [`PageAction`], named by the locator description that
//! resolved the target element.

use crate::browser::BrowserPage;
use crate::result::{A11yError, A11yResult};
use crate::wait::{self, LoadState, WaitOptions};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Error CDP reports when a script runs against a document being replaced
pub const CONTEXT_DESTROYED: &str =
    "Execution context was destroyed, most likely because of a navigation";

/// One recorded interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    /// `goto(url)`
    Goto(String),
    /// `wait_for_load_state(state)`
    WaitForLoad(LoadState),
    /// Click on the element resolved by the named locator
    Click(String),
    /// Text inserted into the element resolved by the named locator
    Fill(String, String),
    /// Key pressed on the element resolved by the named locator
    Press(String, String),
    /// axe-core injected into the page
    InjectAxe,
    /// axe-core run
    Scan,
    /// Page closed
    Close,
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    actions: Vec<PageAction>,
    refs: HashMap<String, String>,
    target: Option<String>,
    axe_loaded: bool,
    last_scan_script: Option<String>,
    ready_index: usize,
    ready_polls: usize,
    lost_evaluations: u32,
}

#[derive(Debug, Deserialize)]
struct ResolveHeader {
    #[serde(rename = "ref")]
    ref_id: Option<String>,
    desc: String,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ActHeader {
    #[serde(rename = "ref")]
    ref_id: String,
    op: String,
}

/// In-memory [`BrowserPage`]
#[derive(Debug)]
pub struct MockPage {
    state: Mutex<MockState>,
    match_counts: HashMap<String, usize>,
    navigations: HashMap<String, String>,
    scan_result: Value,
    scan_failure: Option<String>,
    ready_states: Vec<String>,
    context_loss: u32,
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPage {
    /// A blank page where every locator matches exactly one element and
    /// scans report no violations
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                url: "about:blank".to_string(),
                ..MockState::default()
            }),
            match_counts: HashMap::new(),
            navigations: HashMap::new(),
            scan_result: clean_scan_result("about:blank"),
            scan_failure: None,
            ready_states: vec!["complete".to_string()],
            context_loss: 0,
        }
    }

    /// Make the locator with this description match `count` elements
    #[must_use]
    pub fn with_match_count(mut self, locator: impl Into<String>, count: usize) -> Self {
        let _ = self.match_counts.insert(locator.into(), count);
        self
    }

    /// Clicking the element resolved by `locator` changes the URL to `url`
    #[must_use]
    pub fn with_navigation(mut self, locator: impl Into<String>, url: impl Into<String>) -> Self {
        let _ = self.navigations.insert(locator.into(), url.into());
        self
    }

    /// Raw axe-core result returned by every scan
    #[must_use]
    pub fn with_scan_result(mut self, result: Value) -> Self {
        self.scan_result = result;
        self
    }

    /// Make every scan throw inside the page
    #[must_use]
    pub fn with_scan_failure(mut self, message: impl Into<String>) -> Self {
        self.scan_failure = Some(message.into());
        self
    }

    /// `document.readyState` values reported after each navigation, one per
    /// poll; the last one sticks
    #[must_use]
    pub fn with_ready_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ready_states = states.into_iter().map(Into::into).collect();
        self
    }

    /// After a navigating click, the next `evaluations` script or URL reads
    /// fail with [`CONTEXT_DESTROYED`]
    #[must_use]
    pub const fn with_context_loss(mut self, evaluations: u32) -> Self {
        self.context_loss = evaluations;
        self
    }

    /// Replace the document's execution context now, as a navigation would
    pub fn lose_context(&self) {
        self.lock().lost_evaluations = self.context_loss;
    }

    /// Number of `document.readyState` reads answered so far
    #[must_use]
    pub fn ready_state_polls(&self) -> usize {
        self.lock().ready_polls
    }

    /// Elements currently carrying a locator tag
    #[must_use]
    pub fn tagged_elements(&self) -> usize {
        self.lock().refs.len()
    }

    /// Recorded interactions, oldest first
    #[must_use]
    pub fn actions(&self) -> Vec<PageAction> {
        self.lock().actions.clone()
    }

    /// The last `axe.run` script evaluated, if any
    #[must_use]
    pub fn last_scan_script(&self) -> Option<String> {
        self.lock().last_scan_script.clone()
    }

    /// Current URL
    #[must_use]
    pub fn current_url(&self) -> String {
        self.lock().url.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn target(state: &MockState, action: &str) -> A11yResult<String> {
        state
            .target
            .clone()
            .ok_or_else(|| A11yError::interaction("<none>", action, "no element targeted"))
    }

    fn check_context(&self) -> A11yResult<()> {
        let mut state = self.lock();
        if state.lost_evaluations > 0 {
            state.lost_evaluations -= 1;
            return Err(A11yError::page(CONTEXT_DESTROYED));
        }
        Ok(())
    }

    fn answer(&self, expression: &str) -> A11yResult<Value> {
        if let Some(header) = marker(expression, "resolve") {
            let header: ResolveHeader = serde_json::from_str(header)?;
            let count = self.match_counts.get(&header.desc).copied().unwrap_or(1);
            let taggable = count == 1 || (count > 1 && !header.strict);
            if let (Some(ref_id), true) = (header.ref_id, taggable) {
                let _ = self.lock().refs.insert(ref_id, header.desc);
            }
            return Ok(json!({ "count": count }));
        }
        if let Some(header) = marker(expression, "act") {
            let header: ActHeader = serde_json::from_str(header)?;
            let mut state = self.lock();
            let Some(desc) = state.refs.remove(&header.ref_id) else {
                return Ok(json!({ "error": "detached" }));
            };
            state.target = Some(desc);
            return Ok(match header.op.as_str() {
                "point" => json!({ "x": 10.0, "y": 20.0 }),
                _ => json!({ "focused": true }),
            });
        }
        if marker(expression, "axe-present").is_some() {
            return Ok(Value::Bool(self.lock().axe_loaded));
        }
        if marker(expression, "axe-inject").is_some() {
            let mut state = self.lock();
            state.axe_loaded = true;
            state.actions.push(PageAction::InjectAxe);
            return Ok(Value::Bool(true));
        }
        if marker(expression, "axe-run").is_some() {
            let mut state = self.lock();
            state.actions.push(PageAction::Scan);
            state.last_scan_script = Some(expression.to_string());
            if !state.axe_loaded {
                return Err(A11yError::page("ReferenceError: axe is not defined"));
            }
            if let Some(ref message) = self.scan_failure {
                return Err(A11yError::page(message.clone()));
            }
            return Ok(Value::String(self.scan_result.to_string()));
        }
        if marker(expression, "ready-state").is_some() {
            let mut state = self.lock();
            let ready = self
                .ready_states
                .get(state.ready_index)
                .or_else(|| self.ready_states.last())
                .cloned()
                .unwrap_or_else(|| "complete".to_string());
            state.ready_index += 1;
            state.ready_polls += 1;
            return Ok(Value::String(ready));
        }
        if marker(expression, "href").is_some() {
            return Ok(Value::String(self.lock().url.clone()));
        }
        Ok(Value::Null)
    }
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn goto(&self, url: &str) -> A11yResult<()> {
        let mut state = self.lock();
        state.url = url.to_string();
        state.axe_loaded = false;
        state.ready_index = 0;
        state.actions.push(PageAction::Goto(url.to_string()));
        Ok(())
    }

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        options: &WaitOptions,
    ) -> A11yResult<()> {
        self.lock().actions.push(PageAction::WaitForLoad(state));
        wait::wait_for_ready_state(self, state, options).await
    }

    async fn evaluate(&self, expression: &str) -> A11yResult<Value> {
        self.check_context()?;
        self.answer(expression)
    }

    async fn click_at(&self, _x: f64, _y: f64) -> A11yResult<()> {
        let mut state = self.lock();
        let desc = Self::target(&state, "click")?;
        if let Some(url) = self.navigations.get(&desc) {
            state.url.clone_from(url);
            state.axe_loaded = false;
            state.ready_index = 0;
            state.lost_evaluations = self.context_loss;
        }
        state.actions.push(PageAction::Click(desc));
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> A11yResult<()> {
        let mut state = self.lock();
        let desc = Self::target(&state, "fill")?;
        state.actions.push(PageAction::Fill(desc, text.to_string()));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> A11yResult<()> {
        let mut state = self.lock();
        let desc = Self::target(&state, "press")?;
        state.actions.push(PageAction::Press(desc, key.to_string()));
        Ok(())
    }

    async fn url(&self) -> A11yResult<String> {
        self.check_context()?;
        Ok(self.lock().url.clone())
    }

    async fn close(&self) -> A11yResult<()> {
        self.lock().actions.push(PageAction::Close);
        Ok(())
    }
}

/// Payload of a leading `/* a11y:<tag> <payload> */` comment
fn marker<'a>(expression: &'a str, tag: &str) -> Option<&'a str> {
    let rest = expression.trim_start().strip_prefix("/* a11y:")?;
    let rest = rest.strip_prefix(tag)?;
    if !(rest.starts_with(' ') || rest.starts_with('*')) {
        return None;
    }
    let end = rest.find("*/")?;
    Some(rest[..end].trim())
}

/// A minimal axe-core result with no findings
#[must_use]
pub fn clean_scan_result(url: &str) -> Value {
    json!({
        "testEngine": { "name": "axe-core", "version": "4.10.2" },
        "testRunner": { "name": "axe" },
        "testEnvironment": {
            "userAgent": "MockPage",
            "windowWidth": 1280,
            "windowHeight": 720
        },
        "timestamp": "2026-01-01T00:00:00.000Z",
        "url": url,
        "toolOptions": {
            "runOnly": { "type": "tag", "values": ["wcag2a", "wcag2aa", "wcag21a", "wcag21aa"] }
        },
        "inapplicable": [],
        "passes": [],
        "incomplete": [],
        "violations": []
    })
}
