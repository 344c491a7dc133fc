//! axe-core result model.
//!
//! Field names follow the JSON axe-core produces. Unknown fields are kept in
//! `extra` maps so the attached JSON carries everything the engine reported.

use crate::result::{A11yError, A11yResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write as _;

/// Severity axe-core assigns to a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Minor
    Minor,
    /// Moderate
    Moderate,
    /// Serious
    Serious,
    /// Critical
    Critical,
}

impl Impact {
    /// Lowercase name as axe-core writes it
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Serious => "serious",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine name and version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestEngine {
    /// Engine name (`axe-core`)
    #[serde(default)]
    pub name: String,
    /// Engine version
    #[serde(default)]
    pub version: String,
}

/// Browser environment the scan ran in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEnvironment {
    /// Browser user agent
    #[serde(default)]
    pub user_agent: String,
    /// Viewport width
    #[serde(default)]
    pub window_width: u32,
    /// Viewport height
    #[serde(default)]
    pub window_height: u32,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One check within a node result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check id
    pub id: String,
    /// Check impact
    #[serde(default)]
    pub impact: Option<Impact>,
    /// Check message
    #[serde(default)]
    pub message: String,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One DOM node a rule applied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    /// Outer HTML snippet
    #[serde(default)]
    pub html: String,
    /// CSS selector path; nested arrays cross frame or shadow boundaries
    #[serde(default)]
    pub target: Vec<Value>,
    /// Node impact
    #[serde(default)]
    pub impact: Option<Impact>,
    /// Fix summary, present on violations and incomplete results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_summary: Option<String>,
    /// Checks where any must pass
    #[serde(default)]
    pub any: Vec<CheckResult>,
    /// Checks where all must pass
    #[serde(default)]
    pub all: Vec<CheckResult>,
    /// Checks where none may pass
    #[serde(default)]
    pub none: Vec<CheckResult>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeResult {
    /// Target as one string, e.g. `#app >>> button.close`
    #[must_use]
    pub fn target_selector(&self) -> String {
        fn part(value: &Value) -> String {
            match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items.iter().map(part).collect::<Vec<_>>().join(" >>> "),
                other => other.to_string(),
            }
        }
        self.target.iter().map(part).collect::<Vec<_>>().join(" ")
    }
}

/// Outcome of one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    /// Rule id, e.g. `color-contrast`
    pub id: String,
    /// Highest node impact
    #[serde(default)]
    pub impact: Option<Impact>,
    /// Rule tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Rule description
    #[serde(default)]
    pub description: String,
    /// Short help text
    #[serde(default)]
    pub help: String,
    /// Link to the rule documentation
    #[serde(default)]
    pub help_url: String,
    /// Nodes the rule applied to
    #[serde(default)]
    pub nodes: Vec<NodeResult>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Complete result of one `axe.run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxeResults {
    /// Engine identity
    #[serde(default)]
    pub test_engine: TestEngine,
    /// Browser environment
    #[serde(default)]
    pub test_environment: TestEnvironment,
    /// ISO-8601 time the scan ran
    #[serde(default)]
    pub timestamp: String,
    /// Scanned URL
    #[serde(default)]
    pub url: String,
    /// Options the scan ran with
    #[serde(default)]
    pub tool_options: Value,
    /// Rules that found problems
    #[serde(default)]
    pub violations: Vec<RuleResult>,
    /// Rules that passed
    #[serde(default)]
    pub passes: Vec<RuleResult>,
    /// Rules needing manual review
    #[serde(default)]
    pub incomplete: Vec<RuleResult>,
    /// Rules with nothing to check
    #[serde(default)]
    pub inapplicable: Vec<RuleResult>,
    /// Remaining fields (`testRunner`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rule counts per outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// Violated rules
    pub violations: usize,
    /// Violating nodes across all rules
    pub violating_nodes: usize,
    /// Passed rules
    pub passes: usize,
    /// Incomplete rules
    pub incomplete: usize,
    /// Inapplicable rules
    pub inapplicable: usize,
}

impl AxeResults {
    /// Parse the JSON axe-core returns
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the text is not an axe result
    pub fn from_json(json: &str) -> A11yResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// True when no rule was violated
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Rule counts per outcome
    #[must_use]
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            violations: self.violations.len(),
            violating_nodes: self.violations.iter().map(|v| v.nodes.len()).sum(),
            passes: self.passes.len(),
            incomplete: self.incomplete.len(),
            inapplicable: self.inapplicable.len(),
        }
    }

    /// Plain-text listing of every violation: rule, tags and help link, then
    /// each node's target, HTML and failure summary
    #[must_use]
    pub fn violation_report(&self) -> String {
        let mut out = String::new();
        for rule in &self.violations {
            let impact = rule.impact.map_or("unknown", |i| i.as_str());
            let _ = writeln!(out, "- {} [{impact}]: {}", rule.id, rule.help);
            if !rule.tags.is_empty() {
                let _ = writeln!(out, "  tags: {}", rule.tags.join(", "));
            }
            if !rule.help_url.is_empty() {
                let _ = writeln!(out, "  {}", rule.help_url);
            }
            for node in &rule.nodes {
                let _ = writeln!(out, "    {}", node.target_selector());
                if !node.html.is_empty() {
                    let _ = writeln!(out, "      html: {}", node.html);
                }
                if let Some(ref summary) = node.failure_summary {
                    for line in summary.lines() {
                        let _ = writeln!(out, "      {line}");
                    }
                }
            }
        }
        out
    }

    /// Fail unless the scan found no violations
    ///
    /// # Errors
    ///
    /// [`A11yError::ViolationsFound`] listing each violated rule and node
    pub fn ensure_no_violations(&self) -> A11yResult<()> {
        if self.is_clean() {
            return Ok(());
        }
        Err(A11yError::ViolationsFound {
            count: self.violations.len(),
            details: self.violation_report(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "testEngine": { "name": "axe-core", "version": "4.10.2" },
            "testRunner": { "name": "axe" },
            "testEnvironment": { "userAgent": "Chrome", "windowWidth": 1280, "windowHeight": 720, "orientationAngle": 0 },
            "timestamp": "2026-10-18T10:00:00.000Z",
            "url": "https://www.reddit.com/",
            "toolOptions": { "runOnly": { "type": "tag", "values": ["wcag2a"] } },
            "violations": [{
                "id": "color-contrast",
                "impact": "serious",
                "tags": ["wcag2aa", "wcag143"],
                "description": "Ensures contrast",
                "help": "Elements must meet minimum color contrast ratio thresholds",
                "helpUrl": "https://dequeuniversity.com/rules/axe/4.10/color-contrast",
                "nodes": [{
                    "html": "<span>faint</span>",
                    "target": [["shreddit-app", "span.faint"]],
                    "impact": "serious",
                    "failureSummary": "Fix any of the following",
                    "any": [{ "id": "color-contrast", "impact": "serious", "message": "low", "data": {} }],
                    "all": [],
                    "none": []
                }]
            }],
            "passes": [{ "id": "html-has-lang", "impact": null, "nodes": [] }],
            "incomplete": [],
            "inapplicable": [{ "id": "area-alt", "nodes": [] }]
        })
    }

    #[test]
    fn test_parse_and_summary() {
        let results: AxeResults = serde_json::from_value(sample()).unwrap();
        assert_eq!(results.test_engine.version, "4.10.2");
        assert!(!results.is_clean());
        assert_eq!(
            results.summary(),
            ScanSummary {
                violations: 1,
                violating_nodes: 1,
                passes: 1,
                incomplete: 0,
                inapplicable: 1,
            }
        );
        assert_eq!(results.violations[0].impact, Some(Impact::Serious));
    }

    #[test]
    fn test_unknown_fields_survive() {
        let results: AxeResults = serde_json::from_value(sample()).unwrap();
        let back = serde_json::to_value(&results).unwrap();
        assert_eq!(back["testRunner"]["name"], "axe");
        assert_eq!(back["testEnvironment"]["orientationAngle"], 0);
        assert_eq!(back["violations"][0]["nodes"][0]["any"][0]["data"], json!({}));
    }

    #[test]
    fn test_shadow_target_selector() {
        let results: AxeResults = serde_json::from_value(sample()).unwrap();
        assert_eq!(
            results.violations[0].nodes[0].target_selector(),
            "shreddit-app >>> span.faint"
        );
    }

    #[test]
    fn test_ensure_no_violations_lists_rules() {
        let results: AxeResults = serde_json::from_value(sample()).unwrap();
        let err = results.ensure_no_violations().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("color-contrast [serious]"));
        assert!(message.contains("shreddit-app >>> span.faint"));
    }

    #[test]
    fn test_violation_report_carries_node_detail() {
        let mut raw = sample();
        raw["violations"][0]["nodes"][0]["failureSummary"] =
            json!("Fix any of the following:\n  Element has insufficient color contrast");
        let results: AxeResults = serde_json::from_value(raw).unwrap();
        let report = results.violation_report();
        assert!(report.contains("  tags: wcag2aa, wcag143\n"));
        assert!(report.contains("https://dequeuniversity.com/rules/axe/4.10/color-contrast"));
        assert!(report.contains("      html: <span>faint</span>\n"));
        assert!(report.contains("      Fix any of the following:\n"));
        assert!(report.contains("        Element has insufficient color contrast\n"));
    }

    #[test]
    fn test_clean_results() {
        let results = AxeResults::from_json(r#"{"violations": [], "passes": []}"#).unwrap();
        assert!(results.ensure_no_violations().is_ok());
        assert!(results.violation_report().is_empty());
    }

    #[test]
    fn test_impact_ordering() {
        assert!(Impact::Critical > Impact::Serious);
        assert!(Impact::Minor < Impact::Moderate);
    }
}
