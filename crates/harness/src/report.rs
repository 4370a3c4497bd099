//! Run report artifacts
//!
//! Every run writes `results.json` plus an HTML report under the output
//! directory. Opening the report in a browser is left to the caller so it
//! only happens on failure.

use std::path::{Path, PathBuf};

use chrono::Utc;
use snapcheck_core::{CaseOutcome, RunSummary};
use tracing::info;

use crate::error::HarnessResult;

pub fn report_path(output_dir: &Path) -> PathBuf {
    output_dir.join("report.html")
}

pub fn results_path(output_dir: &Path) -> PathBuf {
    output_dir.join("results.json")
}

/// The last generated report, if any run has produced one
pub fn last_report(output_dir: &Path) -> Option<PathBuf> {
    let path = report_path(output_dir);
    path.exists().then_some(path)
}

pub fn write_json(summary: &RunSummary, output_dir: &Path) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = results_path(output_dir);
    std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;
    info!("results written to {}", path.display());
    Ok(path)
}

pub fn write_html(summary: &RunSummary, output_dir: &Path) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = report_path(output_dir);
    std::fs::write(&path, render_html(summary))?;
    info!("report written to {}", path.display());
    Ok(path)
}

/// Open the report with the platform's default browser
pub fn open_report(path: &Path) -> HarnessResult<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(opener).arg(path).spawn()?;
    Ok(())
}

fn render_html(summary: &RunSummary) -> String {
    let mut html = String::new();

    html.push_str(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>snapcheck report</title>
<style>
  body { font-family: sans-serif; margin: 2em; color: #222; }
  table { border-collapse: collapse; width: 100%; }
  th, td { border: 1px solid #ccc; padding: 6px 10px; text-align: left; }
  th { background: #f4f4f4; }
  .passed { color: #187a2f; }
  .baseline-created { color: #8a6d00; }
  .failed, .errored { color: #b00020; }
  .meta { color: #666; }
</style>
</head>
<body>
<h1>snapcheck report</h1>
"#,
    );

    html.push_str(&format!(
        "<p class=\"meta\">generated {}</p>\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    html.push_str(&format!(
        "<p>{} passed, {} baselines created, {} failed, {} errored ({} ms)</p>\n",
        summary.passed,
        summary.baselines_created,
        summary.failed,
        summary.errored,
        summary.duration_ms
    ));

    html.push_str(
        "<table>\n<tr><th>Case</th><th>Outcome</th><th>Duration</th>\
         <th>Attempts</th><th>Diff pixels</th><th>Detail</th></tr>\n",
    );

    for result in &summary.results {
        let outcome_class = match result.outcome {
            CaseOutcome::Passed => "passed",
            CaseOutcome::BaselineCreated => "baseline-created",
            CaseOutcome::Failed => "failed",
            CaseOutcome::Errored => "errored",
        };

        let diff_pixels = result
            .diff_pixel_count
            .map(|n| n.to_string())
            .unwrap_or_default();

        let mut detail = result
            .error
            .as_deref()
            .map(escape_html)
            .unwrap_or_default();
        if let Some(diff_image) = &result.diff_image {
            detail.push_str(&format!(
                " <a href=\"{}\">diff image</a>",
                escape_html(diff_image)
            ));
        }

        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"{}\">{}</td><td>{} ms</td>\
             <td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&result.name),
            outcome_class,
            result.outcome,
            result.duration_ms,
            result.attempts,
            diff_pixels,
            detail
        ));
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapcheck_core::CaseResult;

    fn summary() -> RunSummary {
        RunSummary::from_results(
            vec![
                CaseResult {
                    name: "aboutpage".to_string(),
                    outcome: CaseOutcome::Passed,
                    duration_ms: 812,
                    attempts: 1,
                    diff_pixel_count: Some(0),
                    diff_image: None,
                    error: None,
                },
                CaseResult {
                    name: "landing".to_string(),
                    outcome: CaseOutcome::Failed,
                    duration_ms: 954,
                    attempts: 1,
                    diff_pixel_count: Some(150),
                    diff_image: Some("diffs/landing-linux-diff.png".to_string()),
                    error: Some("150 pixels differ (max allowed: 100)".to_string()),
                },
            ],
            1766,
        )
    }

    #[test]
    fn test_render_contains_counts_and_cases() {
        let html = render_html(&summary());
        assert!(html.contains("1 passed, 0 baselines created, 1 failed, 0 errored"));
        assert!(html.contains("aboutpage"));
        assert!(html.contains("diffs/landing-linux-diff.png"));
        assert!(html.contains("150 pixels differ"));
    }

    #[test]
    fn test_render_escapes_markup() {
        let mut s = summary();
        s.results[1].error = Some("selector <main> & friends".to_string());
        let html = render_html(&s);
        assert!(html.contains("selector &lt;main&gt; &amp; friends"));
        assert!(!html.contains("selector <main>"));
    }

    #[test]
    fn test_artifacts_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let s = summary();

        let json_path = write_json(&s, dir.path()).unwrap();
        let html_path = write_html(&s, dir.path()).unwrap();

        let loaded: RunSummary =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(loaded.total, 2);
        assert_eq!(loaded.results[1].diff_pixel_count, Some(150));

        assert_eq!(last_report(dir.path()), Some(html_path));
    }

    #[test]
    fn test_no_report_before_first_run() {
        let dir = tempfile::tempdir().unwrap();
        assert!(last_report(dir.path()).is_none());
    }
}
