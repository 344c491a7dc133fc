//! Locator abstraction for element selection and interaction.
//!
//! Locators are lazy, strict and auto-waiting:
//!
//! - **Lazy**: a locator holds a selector and a page handle, nothing is
//!   resolved until an action runs
//! - **Auto-waiting**: resolution polls until a visible match exists or the
//!   timeout elapses
//! - **Strict**: more than one match is an error unless strict mode is off
//! - **Semantic**: elements are found by ARIA role, accessible name and label
//!   text, searching open shadow roots
//!
//! Only an element about to be acted on is tagged; counting and failed
//! lookups leave the document untouched.

use crate::browser::PageHandle;
use crate::config::SuiteConfig;
use crate::result::{A11yError, A11yResult};
use crate::wait::{poll_until, WaitOptions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

/// Default timeout for auto-waiting (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Attribute placed on a resolved element until the action consumes it
pub const REF_ATTRIBUTE: &str = "data-a11y-ref";

/// ARIA roles the page models look elements up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    /// `a[href]`
    Link,
    /// `input[type=search]`
    Searchbox,
}

impl AriaRole {
    /// Role name as written in the `role` attribute
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Searchbox => "searchbox",
        }
    }
}

impl std::fmt::Display for AriaRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// ARIA role, optionally filtered by accessible name
    Role {
        /// Explicit or implicit role
        role: AriaRole,
        /// Accessible name filter
        name: Option<String>,
        /// Whole-string, case-sensitive name match
        exact: bool,
    },
    /// `aria-label`, `aria-labelledby` or associated `<label>` text
    Label {
        /// Label text
        text: String,
        /// Whole-string, case-sensitive match
        exact: bool,
    },
}

impl Selector {
    /// Create a role selector
    #[must_use]
    pub const fn role(role: AriaRole) -> Self {
        Self::Role {
            role,
            name: None,
            exact: false,
        }
    }

    /// Create a label selector
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label {
            text: text.into(),
            exact: false,
        }
    }

    /// Human-readable form used in errors and logs, e.g.
    /// `role=link[name="Popular"]`
    #[must_use]
    pub fn describe(&self) -> String {
        let suffix = |exact: bool| if exact { "s" } else { "" };
        match self {
            Self::Role {
                role,
                name: Some(name),
                exact,
            } => format!("role={role}[name={name:?}{}]", suffix(*exact)),
            Self::Role { role, .. } => format!("role={role}"),
            Self::Label { text, exact } => format!("label={text:?}{}", suffix(*exact)),
        }
    }

    /// Expression evaluating to `{ count }` of visible matches.
    ///
    /// With `ref_id`, the first match is tagged with it when the lookup can
    /// act on it: exactly one match, or any number when not `strict`.
    #[must_use]
    pub fn resolve_script(&self, ref_id: Option<&str>, strict: bool) -> String {
        let header = json!({ "ref": ref_id, "desc": self.describe(), "strict": strict });
        let selector = serde_json::to_string(self).unwrap_or_else(|_| "null".to_string());
        format!(
            "/* a11y:resolve {} */ ({RESOLVE_JS})({selector}, {}, {REF_ATTRIBUTE:?}, {strict})",
            comment_safe(&header.to_string()),
            json!(ref_id)
        )
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// JSON text may not close the marker comment early
fn comment_safe(json: &str) -> String {
    json.replace("*/", "*\\/")
}

const RESOLVE_JS: &str = r#"(sel, ref, attr, strict) => {
  const all = [];
  const walk = (root) => {
    for (const el of root.querySelectorAll('*')) {
      all.push(el);
      if (el.shadowRoot) walk(el.shadowRoot);
    }
  };
  walk(document);
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const textMatch = (actual, expected, exact) =>
    exact ? actual === expected : actual.toLowerCase().includes(expected.toLowerCase());
  const visible = (el) => {
    if (el.closest('[aria-hidden="true"]')) return false;
    const style = getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    return el.getClientRects().length > 0;
  };
  const implicitRole = (el) => {
    const type = (el.getAttribute('type') || 'text').toLowerCase();
    switch (el.localName) {
      case 'a': case 'area': return el.hasAttribute('href') ? 'link' : null;
      case 'button': return 'button';
      case 'input':
        if (type === 'search') return el.hasAttribute('list') ? 'combobox' : 'searchbox';
        if (['button', 'submit', 'reset', 'image'].includes(type)) return 'button';
        if (type === 'checkbox') return 'checkbox';
        if (['text', 'email', 'tel', 'url'].includes(type)) return el.hasAttribute('list') ? 'combobox' : 'textbox';
        return null;
      case 'textarea': return 'textbox';
      case 'select': return el.multiple || el.size > 1 ? 'listbox' : 'combobox';
      case 'img': return el.getAttribute('alt') === '' ? 'presentation' : 'img';
      case 'nav': return 'navigation';
      case 'main': return 'main';
      case 'header': return 'banner';
      case 'h1': case 'h2': case 'h3': case 'h4': case 'h5': case 'h6': return 'heading';
      default: return null;
    }
  };
  const roleOf = (el) => {
    const explicit = norm(el.getAttribute('role'));
    return explicit ? explicit.split(' ')[0] : implicitRole(el);
  };
  const labelText = (el) => {
    const root = el.getRootNode();
    const ids = el.getAttribute('aria-labelledby');
    if (ids && root.getElementById) {
      const text = ids.split(/\s+/)
        .map((id) => root.getElementById(id))
        .filter(Boolean)
        .map((node) => norm(node.textContent))
        .join(' ');
      if (text) return text;
    }
    const aria = norm(el.getAttribute('aria-label'));
    if (aria) return aria;
    if (el.labels && el.labels.length) {
      return norm(Array.from(el.labels).map((l) => l.textContent).join(' '));
    }
    return '';
  };
  const accessibleName = (el) =>
    labelText(el) ||
    norm(el.getAttribute('alt')) ||
    norm(el.getAttribute('title')) ||
    norm(el.getAttribute('placeholder')) ||
    norm(el.textContent);
  const matches = (el) => {
    switch (sel.kind) {
      case 'role':
        return roleOf(el) === sel.role &&
          (sel.name == null || textMatch(accessibleName(el), sel.name, sel.exact));
      case 'label': {
        const label = labelText(el);
        return label !== '' && textMatch(label, sel.text, sel.exact);
      }
      default: return false;
    }
  };
  const found = all.filter((el) => matches(el) && visible(el));
  if (ref && (found.length === 1 || (found.length > 1 && !strict))) {
    found[0].setAttribute(attr, ref);
  }
  return { count: found.length };
}"#;

const ACT_JS: &str = r#"(ref, attr, op) => {
  const find = (root) => {
    const hit = root.querySelector(`[${attr}="${ref}"]`);
    if (hit) return hit;
    for (const el of root.querySelectorAll('*')) {
      if (el.shadowRoot) {
        const inner = find(el.shadowRoot);
        if (inner) return inner;
      }
    }
    return null;
  };
  const el = find(document);
  if (!el) return { error: 'element is no longer attached' };
  el.removeAttribute(attr);
  el.scrollIntoView({ block: 'center', inline: 'center' });
  if (op === 'point') {
    const rect = el.getBoundingClientRect();
    return { x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 };
  }
  el.focus();
  if (op === 'clear') {
    if ('value' in el) {
      el.value = '';
      el.dispatchEvent(new Event('input', { bubbles: true }));
    } else if (el.isContentEditable) {
      el.textContent = '';
    }
  }
  return { focused: true };
}"#;

/// What the action script does with the resolved element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActOp {
    /// Scroll into view and report the centre point
    Point,
    /// Focus
    Focus,
    /// Focus and clear its value
    Clear,
}

impl ActOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Focus => "focus",
            Self::Clear => "clear",
        }
    }

    fn script(self, ref_id: &str) -> String {
        let header = json!({ "ref": ref_id, "op": self.as_str() });
        format!(
            "/* a11y:act {} */ ({ACT_JS})({ref_id:?}, {REF_ATTRIBUTE:?}, {:?})",
            comment_safe(&header.to_string()),
            self.as_str()
        )
    }
}

#[derive(Debug, Deserialize)]
struct ClickPoint {
    x: f64,
    y: f64,
}

/// Locator options for customizing behavior
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether to require strict single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

impl From<&SuiteConfig> for LocatorOptions {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.action_timeout_ms),
            ..Self::default()
        }
    }
}

impl LocatorOptions {
    fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(duration_ms(self.timeout))
            .with_poll_interval(duration_ms(self.poll_interval))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A lazy reference to one element on a live page.
#[derive(Debug, Clone)]
pub struct Locator {
    page: PageHandle,
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator on `page`
    #[must_use]
    pub fn new(page: &PageHandle, selector: Selector) -> Self {
        Self {
            page: PageHandle::clone(page),
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Filter a role locator by accessible name. No effect on other selectors.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        if let Selector::Role { name: ref mut slot, .. } = self.selector {
            *slot = Some(name.into());
        }
        self
    }

    /// Require whole-string, case-sensitive name or text matches
    #[must_use]
    pub fn exact(mut self, exact: bool) -> Self {
        match self.selector {
            Selector::Role { exact: ref mut e, .. } | Selector::Label { exact: ref mut e, .. } => {
                *e = exact;
            }
        }
        self
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Disable strict mode (allow multiple matches, act on the first)
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Replace all options
    #[must_use]
    pub fn with_options(mut self, options: LocatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Wait for the element and tag it, returning the tag value
    ///
    /// # Errors
    ///
    /// [`A11yError::ElementNotFound`] when nothing matches in time,
    /// [`A11yError::StrictModeViolation`] when several elements match, or the
    /// page error if the document still cannot run scripts at the deadline.
    pub async fn resolve(&self) -> A11yResult<String> {
        let ref_id = Uuid::new_v4().to_string();
        let strict = self.options.strict;
        let script = self.selector.resolve_script(Some(ref_id.as_str()), strict);
        let desc = self.selector.describe();
        let page = &self.page;
        let script = &script;
        let locator = &desc;

        let result = poll_until(&desc, &self.options.wait_options(), || async move {
            let found = page.evaluate(script).await?;
            let count = found.get("count").and_then(Value::as_u64).unwrap_or(0);
            if count > 1 && strict {
                return Err(A11yError::StrictModeViolation {
                    locator: locator.clone(),
                    count: usize::try_from(count).unwrap_or(usize::MAX),
                });
            }
            Ok(count >= 1)
        })
        .await;

        match result {
            Ok(()) => Ok(ref_id),
            Err(A11yError::Timeout { ms, .. }) => Err(A11yError::ElementNotFound {
                locator: desc,
                timeout_ms: ms,
            }),
            Err(e) => Err(e),
        }
    }

    /// Number of visible matches right now, without waiting or tagging
    ///
    /// # Errors
    ///
    /// Returns the page's evaluation error
    pub async fn count(&self) -> A11yResult<usize> {
        let script = self.selector.resolve_script(None, self.options.strict);
        let found = self.page.evaluate(&script).await?;
        let count = found.get("count").and_then(Value::as_u64).unwrap_or(0);
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    async fn act(&self, op: ActOp, action: &str) -> A11yResult<Value> {
        let ref_id = self.resolve().await?;
        let outcome = self.page.evaluate(&op.script(&ref_id)).await?;
        if let Some(message) = outcome.get("error").and_then(Value::as_str) {
            return Err(A11yError::interaction(
                self.selector.describe(),
                action,
                message,
            ));
        }
        Ok(outcome)
    }

    /// Click the element's centre with a trusted mouse event
    ///
    /// # Errors
    ///
    /// Returns error if the element cannot be resolved or clicked
    pub async fn click(&self) -> A11yResult<()> {
        let outcome = self.act(ActOp::Point, "click").await?;
        let point: ClickPoint = serde_json::from_value(outcome).map_err(|e| {
            A11yError::interaction(self.selector.describe(), "click", e.to_string())
        })?;
        self.page.click_at(point.x, point.y).await?;
        tracing::debug!(locator = %self.selector, "clicked");
        Ok(())
    }

    /// Clear the element and type `text` into it
    ///
    /// # Errors
    ///
    /// Returns error if the element cannot be resolved or focused
    pub async fn fill(&self, text: &str) -> A11yResult<()> {
        let _ = self.act(ActOp::Clear, "fill").await?;
        self.page.insert_text(text).await?;
        tracing::debug!(locator = %self.selector, "filled");
        Ok(())
    }

    /// Focus the element and press `key` (e.g. `Enter`)
    ///
    /// # Errors
    ///
    /// Returns error if the element cannot be resolved or the key is unknown
    pub async fn press(&self, key: &str) -> A11yResult<()> {
        let _ = self.act(ActOp::Focus, "press").await?;
        self.page.press_key(key).await?;
        tracing::debug!(locator = %self.selector, key, "pressed");
        Ok(())
    }
}

/// Locator constructors on a page handle
pub trait PageLocators {
    /// Elements with this ARIA role
    fn get_by_role(&self, role: AriaRole) -> Locator;
    /// Elements labelled with this text
    fn get_by_label(&self, text: &str) -> Locator;
}

impl PageLocators for PageHandle {
    fn get_by_role(&self, role: AriaRole) -> Locator {
        Locator::new(self, Selector::role(role))
    }

    fn get_by_label(&self, text: &str) -> Locator {
        Locator::new(self, Selector::label(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, PageAction};
    use std::sync::Arc;

    fn fast() -> LocatorOptions {
        LocatorOptions {
            timeout: Duration::from_millis(40),
            poll_interval: Duration::from_millis(5),
            strict: true,
        }
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_describe() {
            let role = Selector::Role {
                role: AriaRole::Link,
                name: Some("Popular".to_string()),
                exact: false,
            };
            assert_eq!(role.describe(), r#"role=link[name="Popular"]"#);
            assert_eq!(Selector::role(AriaRole::Searchbox).describe(), "role=searchbox");
            assert_eq!(Selector::label("Home").describe(), r#"label="Home""#);
        }

        #[test]
        fn test_exact_suffix() {
            let exact = Selector::Label {
                text: "Home".to_string(),
                exact: true,
            };
            assert_eq!(exact.describe(), r#"label="Home"s"#);
        }

        #[test]
        fn test_serialized_shape() {
            let json = serde_json::to_value(Selector::Role {
                role: AriaRole::Searchbox,
                name: None,
                exact: false,
            })
            .unwrap();
            assert_eq!(json["kind"], "role");
            assert_eq!(json["role"], "searchbox");
            assert_eq!(serde_json::to_value(Selector::label("x")).unwrap()["kind"], "label");
        }

        #[test]
        fn test_resolve_script_header() {
            let script = Selector::label("/*x*/").resolve_script(Some("r1"), true);
            assert!(script.starts_with("/* a11y:resolve {"));
            let header_end = script.find(" */").unwrap();
            assert!(!script[..header_end].contains("*/"));
            assert!(script.contains(REF_ATTRIBUTE));
            assert!(script.ends_with(r#""r1", "data-a11y-ref", true)"#));
        }

        #[test]
        fn test_count_script_carries_no_ref() {
            let script = Selector::role(AriaRole::Link).resolve_script(None, false);
            assert!(script.contains(r#""ref":null"#));
            assert!(script.ends_with(r#"null, "data-a11y-ref", false)"#));
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_builders() {
            let page: PageHandle = Arc::new(MockPage::new());
            let locator = page
                .get_by_role(AriaRole::Link)
                .with_name("All")
                .exact(true)
                .with_timeout(Duration::from_secs(2))
                .with_strict(false);
            assert_eq!(locator.selector().describe(), r#"role=link[name="All"s]"#);
            assert_eq!(locator.options().timeout, Duration::from_secs(2));
            assert!(!locator.options().strict);
        }

        #[test]
        fn test_with_name_ignored_for_labels() {
            let page: PageHandle = Arc::new(MockPage::new());
            let locator = page.get_by_label("Home").with_name("ignored");
            assert_eq!(locator.selector(), &Selector::label("Home"));
        }

        #[test]
        fn test_options_from_config() {
            let config = SuiteConfig::default().with_action_timeout(1_234);
            assert_eq!(LocatorOptions::from(&config).timeout, Duration::from_millis(1_234));
        }

        #[tokio::test]
        async fn test_click_records_trusted_click() {
            let mock = Arc::new(MockPage::new());
            let page: PageHandle = mock.clone();
            page.get_by_label("Home").with_options(fast()).click().await.unwrap();
            assert_eq!(mock.actions(), vec![PageAction::Click(r#"label="Home""#.to_string())]);
        }

        #[tokio::test]
        async fn test_fill_and_press() {
            let mock = Arc::new(MockPage::new());
            let page: PageHandle = mock.clone();
            let search = page.get_by_role(AriaRole::Searchbox).with_options(fast());
            search.fill("rust").await.unwrap();
            search.press("Enter").await.unwrap();
            assert_eq!(
                mock.actions(),
                vec![
                    PageAction::Fill("role=searchbox".to_string(), "rust".to_string()),
                    PageAction::Press("role=searchbox".to_string(), "Enter".to_string()),
                ]
            );
        }

        #[tokio::test]
        async fn test_missing_element_times_out() {
            let mock = Arc::new(MockPage::new().with_match_count("label=\"Home\"", 0));
            let page: PageHandle = mock.clone();
            let err = page.get_by_label("Home").with_options(fast()).click().await.unwrap_err();
            assert!(matches!(
                err,
                A11yError::ElementNotFound { ref locator, timeout_ms: 40 } if locator == "label=\"Home\""
            ));
            assert!(mock.actions().is_empty());
        }

        #[tokio::test]
        async fn test_strict_mode_violation() {
            let mock = Arc::new(MockPage::new().with_match_count("role=searchbox", 2));
            let page: PageHandle = mock.clone();
            let err = page
                .get_by_role(AriaRole::Searchbox)
                .with_options(fast())
                .fill("x")
                .await
                .unwrap_err();
            assert!(matches!(err, A11yError::StrictModeViolation { count: 2, .. }));
        }

        #[tokio::test]
        async fn test_non_strict_acts_on_first_match() {
            let mock = Arc::new(MockPage::new().with_match_count("role=searchbox", 3));
            let page: PageHandle = mock.clone();
            let search = page
                .get_by_role(AriaRole::Searchbox)
                .with_options(fast())
                .with_strict(false);
            assert_eq!(search.count().await.unwrap(), 3);
            assert_eq!(mock.tagged_elements(), 0);
            search.press("Enter").await.unwrap();
            assert_eq!(mock.actions().len(), 1);
            assert_eq!(mock.tagged_elements(), 0);
        }

        #[tokio::test]
        async fn test_strict_failure_leaves_no_tag() {
            let mock = Arc::new(MockPage::new().with_match_count("role=searchbox", 2));
            let page: PageHandle = mock.clone();
            let search = page.get_by_role(AriaRole::Searchbox).with_options(fast());
            assert_eq!(search.count().await.unwrap(), 2);
            assert!(search.click().await.is_err());
            assert_eq!(mock.tagged_elements(), 0);
        }

        #[tokio::test]
        async fn test_resolution_rides_out_context_loss() {
            let mock = Arc::new(MockPage::new().with_context_loss(2));
            mock.lose_context();
            let page: PageHandle = mock.clone();
            page.get_by_label("Home").with_options(fast()).click().await.unwrap();
            assert_eq!(mock.actions(), vec![PageAction::Click(r#"label="Home""#.to_string())]);
        }
    }
}
