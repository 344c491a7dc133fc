//! HTML accessibility reports.
//!
//! One self-contained HTML file per scanned page, written to
//! `<report_dir>/accessibility-report-<page>.html`.

use crate::config::SuiteConfig;
use crate::result::{A11yError, A11yResult};
use crate::scan_result::{AxeResults, RuleResult};
use std::path::{Path, PathBuf};

/// Where and under which label a report is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Project label shown in the report heading
    pub project_key: String,
    /// Directory the report is written to (created if missing)
    pub output_dir: PathBuf,
    /// File name within `output_dir`
    pub report_file_name: String,
}

impl ReportOptions {
    /// Create report options
    #[must_use]
    pub fn new(
        project_key: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        report_file_name: impl Into<String>,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            output_dir: output_dir.into(),
            report_file_name: report_file_name.into(),
        }
    }

    /// Suite options for one page: configured label and directory,
    /// `accessibility-report-<page_name>.html`
    #[must_use]
    pub fn for_page(config: &SuiteConfig, page_name: &str) -> Self {
        Self::new(
            config.project_key.clone(),
            config.report_dir.clone(),
            report_file_name(page_name),
        )
    }

    /// Full path of the report file
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file_name)
    }
}

/// `accessibility-report-<page_name>.html`
#[must_use]
pub fn report_file_name(page_name: &str) -> String {
    format!("accessibility-report-{page_name}.html")
}

/// Render results and write them to `options.report_path()`, replacing any
/// earlier report
///
/// # Errors
///
/// Returns [`A11yError::Report`] if the directory or file cannot be written
pub fn create_html_report(results: &AxeResults, options: &ReportOptions) -> A11yResult<PathBuf> {
    let path = options.report_path();
    let report_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| A11yError::Report { path, source }
    };
    std::fs::create_dir_all(&options.output_dir).map_err(report_error(&options.output_dir))?;
    std::fs::write(&path, render_html(results, options)).map_err(report_error(&path))?;
    tracing::info!(path = %path.display(), violations = results.violations.len(), "report written");
    Ok(path)
}

/// Write the report for `page_name` with the suite's label and directory
///
/// # Errors
///
/// Returns [`A11yError::Report`] if the file cannot be written
pub fn create_axe_report(
    results: &AxeResults,
    page_name: &str,
    config: &SuiteConfig,
) -> A11yResult<PathBuf> {
    create_html_report(results, &ReportOptions::for_page(config, page_name))
}

/// Render report content
#[must_use]
pub fn render_html(results: &AxeResults, options: &ReportOptions) -> String {
    let summary = results.summary();
    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title} - Accessibility Report</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; color: #212121; }}
        .summary {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .counts span {{ display: inline-block; margin-right: 16px; font-weight: bold; }}
        .violations {{ color: #c62828; }}
        .passes {{ color: #2e7d32; }}
        .incomplete {{ color: #ef6c00; }}
        table {{ border-collapse: collapse; width: 100%; margin-bottom: 20px; }}
        th, td {{ border: 1px solid #ddd; padding: 6px 10px; text-align: left; vertical-align: top; }}
        th {{ background: #eeeeee; }}
        .rule {{ padding: 10px; margin: 10px 0; border-left: 4px solid #f44336; background: #ffebee; border-radius: 4px; }}
        .impact-critical, .impact-serious {{ color: #b71c1c; font-weight: bold; }}
        .impact-moderate {{ color: #e65100; }}
        .impact-minor {{ color: #827717; }}
        pre {{ white-space: pre-wrap; background: #fff; border: 1px solid #ddd; padding: 6px; }}
    </style>
</head>
<body>
<div class="summary">
    <h1>{title}</h1>
    <p>Page: <a href="{url}">{url}</a></p>
    <p>Scanned {timestamp} with {engine} {version}</p>
    <p class="counts">
        <span class="violations">{violations} violations ({nodes} nodes)</span>
        <span class="passes">{passes} passes</span>
        <span class="incomplete">{incomplete} incomplete</span>
        <span>{inapplicable} inapplicable</span>
    </p>
</div>
"#,
        title = escape_html(&options.project_key),
        url = escape_html(&results.url),
        timestamp = escape_html(&results.timestamp),
        engine = escape_html(&results.test_engine.name),
        version = escape_html(&results.test_engine.version),
        violations = summary.violations,
        nodes = summary.violating_nodes,
        passes = summary.passes,
        incomplete = summary.incomplete,
        inapplicable = summary.inapplicable,
    ));

    if results.violations.is_empty() {
        html.push_str("<h2>No accessibility violations found</h2>\n");
    } else {
        html.push_str("<h2>Violations</h2>\n<table>\n");
        html.push_str("<tr><th>#</th><th>Rule</th><th>Description</th><th>Impact</th><th>Nodes</th></tr>\n");
        for (index, rule) in results.violations.iter().enumerate() {
            html.push_str(&format!(
                "<tr><td>{}</td><td><a href=\"#{id}\">{id}</a></td><td>{}</td><td class=\"impact-{impact}\">{impact}</td><td>{}</td></tr>\n",
                index + 1,
                escape_html(&rule.description),
                rule.nodes.len(),
                id = escape_html(&rule.id),
                impact = impact_label(rule),
            ));
        }
        html.push_str("</table>\n");

        for rule in &results.violations {
            render_violation(&mut html, rule);
        }
    }

    render_rule_list(&mut html, "Incomplete", &results.incomplete);
    render_rule_list(&mut html, "Passes", &results.passes);
    render_rule_list(&mut html, "Inapplicable", &results.inapplicable);

    html.push_str(&format!(
        r#"
<footer>
    <p>Generated {}</p>
</footer>
</body>
</html>
"#,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    html
}

fn impact_label(rule: &RuleResult) -> &'static str {
    rule.impact.map_or("unknown", |impact| impact.as_str())
}

fn render_violation(html: &mut String, rule: &RuleResult) {
    html.push_str(&format!(
        r#"<div class="rule" id="{id}">
    <h3>{id}: {help}</h3>
    <p>{description}</p>
    <p>Impact: <span class="impact-{impact}">{impact}</span> | Tags: {tags} | <a href="{help_url}">Learn more</a></p>
"#,
        id = escape_html(&rule.id),
        help = escape_html(&rule.help),
        description = escape_html(&rule.description),
        impact = impact_label(rule),
        tags = escape_html(&rule.tags.join(", ")),
        help_url = escape_html(&rule.help_url),
    ));

    html.push_str("    <table>\n    <tr><th>Element</th><th>Target</th><th>How to fix</th></tr>\n");
    for node in &rule.nodes {
        html.push_str(&format!(
            "    <tr><td><pre>{}</pre></td><td><code>{}</code></td><td><pre>{}</pre></td></tr>\n",
            escape_html(&node.html),
            escape_html(&node.target_selector()),
            escape_html(node.failure_summary.as_deref().unwrap_or("")),
        ));
    }
    html.push_str("    </table>\n</div>\n");
}

fn render_rule_list(html: &mut String, heading: &str, rules: &[RuleResult]) {
    if rules.is_empty() {
        return;
    }
    html.push_str(&format!(
        "<details>\n<summary>{heading} ({})</summary>\n<ul>\n",
        rules.len()
    ));
    for rule in rules {
        html.push_str(&format!(
            "    <li><strong>{}</strong>: {}</li>\n",
            escape_html(&rule.id),
            escape_html(&rule.help)
        ));
    }
    html.push_str("</ul>\n</details>\n");
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
