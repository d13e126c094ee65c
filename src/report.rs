//! Report data model and rendering.
//!
//! The renderers are pure functions over the ordered result list; the writer
//! is the single-writer step the batch runner calls after the join barrier.
//! Markup mirrors the report this tool has always produced: one visual block
//! per site with either an embedded frame or a blocked indicator, a per-site
//! detail page, and a Markdown summary.

use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use std::path::Path;

use crate::error_handling::{ArtifactWriteError, ErrorStats, ErrorType};
use crate::probe::ProbeOutcome;

/// Classification of one input site.
///
/// `url` is the fully qualified URL of the attempt that produced the outcome
/// (HTTPS, or HTTP after scheme fallback).
#[derive(Debug, Clone, Serialize)]
pub struct SiteResult {
    pub site: String,
    pub url: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

impl SiteResult {
    /// File name of this site's detail page.
    pub fn page_name(&self) -> String {
        format!("{}.html", self.site.replace(':', "_"))
    }
}

/// The ordered results of one batch run plus derived counts.
///
/// Results mirror the input list order regardless of probe completion order;
/// built once per run and not mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub results: Vec<SiteResult>,
    pub frameable: usize,
    pub not_frameable: usize,
    pub elapsed_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

impl AuditReport {
    pub fn new(results: Vec<SiteResult>, elapsed_seconds: f64) -> Self {
        let frameable = results
            .iter()
            .filter(|r| r.outcome.is_frameable())
            .count();
        let not_frameable = results.len() - frameable;
        AuditReport {
            results,
            frameable,
            not_frameable,
            elapsed_seconds,
            completed_at: Utc::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Escapes text for HTML element and attribute positions.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const PAGE_STYLE: &str = r#"
    body { font-family: sans-serif; margin: 2em; background: #f5f5f5; }
    h1 { color: #333; }
    .boxes { display: flex; flex-wrap: wrap; gap: 1em; }
    .box { width: 320px; background: #fff; border: 1px solid #ccc; border-radius: 4px; padding: 0.5em; }
    .box iframe { width: 100%; height: 200px; border: 0; }
    .not-frameable { width: 100%; height: 200px; display: flex; align-items: center; justify-content: center; font-size: 3em; background: #eee; }
    .url { margin-top: 0.5em; font-size: 0.85em; word-break: break-all; }
"#;

/// Renders the HTML index: one block per site, an iframe for frameable sites
/// and a blocked indicator otherwise, each linking to the per-site page.
pub fn render_index(report: &AuditReport) -> String {
    let mut blocks = String::new();
    for result in &report.results {
        let url = escape_html(&result.url);
        let page = escape_html(&result.page_name());
        if result.outcome.is_frameable() {
            blocks.push_str(&format!(
                r#"        <div class="box">
            <iframe src="{url}"></iframe>
            <div class="url"><a href="sites/{page}">{url}</a></div>
        </div>
"#
            ));
        } else {
            blocks.push_str(&format!(
                r#"        <div class="box">
            <div class="not-frameable">🚫</div>
            <div class="url"><a href="sites/{page}">Cannot frame {url}</a></div>
        </div>
"#
            ));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Frameability Report</title>
    <style>{PAGE_STYLE}</style>
</head>
<body>
    <h1>Frameability Report</h1>
    <p>{frameable} frameable, {not_frameable} not frameable ({total} total)</p>
    <div class="boxes">
{blocks}    </div>
</body>
</html>
"#,
        frameable = report.frameable,
        not_frameable = report.not_frameable,
        total = report.total(),
    )
}

/// Renders one site's detail page.
pub fn render_site_page(result: &SiteResult) -> String {
    let url = escape_html(&result.url);
    let site = escape_html(&result.site);
    let frame_content = match &result.outcome {
        ProbeOutcome::Frameable => format!(r#"<iframe src="{url}"></iframe>"#),
        ProbeOutcome::NotFrameable { reason } => format!(
            r#"<div class="not-frameable" title="{}">Website was not frameable</div>"#,
            escape_html(reason.describe())
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{site}</title>
    <style>{PAGE_STYLE}</style>
</head>
<body>
    <h1>{site}</h1>
    <div class="box">
        {frame_content}
        <div class="url"><a href="{url}">{url}</a></div>
    </div>
</body>
</html>
"#
    )
}

/// Renders the Markdown summary: counts, frameable sites, and not-frameable
/// sites with reasons, in report order.
pub fn render_summary(report: &AuditReport) -> String {
    let mut summary = String::new();
    summary.push_str("# Frameability Summary\n\n");
    summary.push_str(&format!(
        "Checked {} site(s) in {:.1}s: {} frameable, {} not frameable.\n\n",
        report.total(),
        report.elapsed_seconds,
        report.frameable,
        report.not_frameable
    ));

    summary.push_str(&format!("## Frameable Websites ({})\n", report.frameable));
    for result in &report.results {
        if result.outcome.is_frameable() {
            summary.push_str(&format!("- {}\n", result.url));
        }
    }

    summary.push_str(&format!(
        "\n## Not Frameable Websites ({})\n",
        report.not_frameable
    ));
    for result in &report.results {
        if let ProbeOutcome::NotFrameable { reason } = &result.outcome {
            summary.push_str(&format!(
                "- [{}](sites/{}) (Reason: {})\n",
                result.url,
                result.page_name(),
                reason.describe()
            ));
        }
    }

    summary
}

fn write_file(path: &Path, content: &str) -> Result<(), ArtifactWriteError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ArtifactWriteError::CreateDir {
            dir: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| ArtifactWriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `index.html`, `summary.md`, and the per-site pages under `out_dir`.
///
/// Failures are logged and counted but never abort the run; the report data
/// itself is already final at this point.
pub fn write_report(report: &AuditReport, out_dir: &Path, stats: &ErrorStats) {
    let mut writes: Vec<(std::path::PathBuf, String)> = Vec::new();
    writes.push((out_dir.join("index.html"), render_index(report)));
    writes.push((out_dir.join("summary.md"), render_summary(report)));
    for result in &report.results {
        writes.push((
            out_dir.join("sites").join(result.page_name()),
            render_site_page(result),
        ));
    }

    for (path, content) in writes {
        if let Err(e) = write_file(&path, &content) {
            warn!("{e}");
            stats.increment(ErrorType::ArtifactWriteError);
        }
    }
}
