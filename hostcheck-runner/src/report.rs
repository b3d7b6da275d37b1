//! Reporting pipeline: rendering, persistence, retention, notifications.
//!
//! A completed (or aborted) [`RunReport`] is rendered twice: a
//! human-readable text report and a machine-readable JSON document that
//! round-trips every field. Both land in the run's artifacts directory
//! next to any files the checks produced.
//!
//! Notification dispatch is best-effort and side-channel: a webhook
//! receives the condensed summary, an API endpoint receives the full
//! structured report with bearer auth. Dispatch failures are logged and
//! never change the run's outcome or exit code.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use hostcheck_core::config::ReportingConfig;
use hostcheck_core::error::ReportError;
use hostcheck_core::result::{CheckState, RunReport, RunSummary};

/// Filename of the human-readable report inside the run directory.
const TEXT_REPORT_FILENAME: &str = "report.txt";
/// Filename of the structured report inside the run directory.
const JSON_REPORT_FILENAME: &str = "report.json";
/// Timeout applied to each notification request.
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders and persists a run report, and dispatches notifications.
pub struct Reporter {
    report: RunReport,
}

/// Paths of the persisted report artifacts.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub json: PathBuf,
}

/// Condensed summary POSTed to the webhook endpoint.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    run_id: Uuid,
    suite_name: &'a str,
    total: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    timed_out: usize,
    skipped: usize,
    pass_rate: f64,
    duration_secs: f64,
    aborted: bool,
}

impl<'a> WebhookPayload<'a> {
    fn new(report: &'a RunReport, summary: &RunSummary) -> Self {
        Self {
            run_id: report.run_id,
            suite_name: &report.suite_name,
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            errors: summary.errors,
            timed_out: summary.timed_out,
            skipped: summary.skipped,
            pass_rate: summary.pass_rate,
            duration_secs: summary.duration_secs,
            aborted: report.aborted,
        }
    }
}

impl Reporter {
    /// Take ownership of a completed run report.
    pub fn new(report: RunReport) -> Self {
        Self { report }
    }

    /// The underlying report.
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Render the human-readable report.
    pub fn render_text(&self) -> String {
        let summary = self.report.summary();
        let banner = "=".repeat(78);
        let mut out = String::new();

        let _ = writeln!(out, "{banner}");
        let _ = writeln!(out, "hostcheck run report");
        let _ = writeln!(out, "{banner}");
        let _ = writeln!(out);
        let _ = writeln!(out, "Suite:    {}", self.report.suite_name);
        let _ = writeln!(out, "Run id:   {}", self.report.run_id);
        let _ = writeln!(out, "Started:  {}", self.report.started_at.to_rfc3339());
        let _ = writeln!(out, "Finished: {}", self.report.ended_at.to_rfc3339());
        let _ = writeln!(out, "Duration: {:.2}s", summary.duration_secs);
        if self.report.aborted {
            let _ = writeln!(out, "Aborted:  run truncated before all checks were attempted");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Summary:");
        let _ = writeln!(out, "  Total:     {}", summary.total);
        let _ = writeln!(out, "  Passed:    {}", summary.passed);
        let _ = writeln!(out, "  Failed:    {}", summary.failed);
        let _ = writeln!(out, "  Errors:    {}", summary.errors);
        let _ = writeln!(out, "  Timed out: {}", summary.timed_out);
        let _ = writeln!(out, "  Skipped:   {}", summary.skipped);
        let _ = writeln!(out, "  Pass rate: {:.1}%", summary.pass_rate);
        let _ = writeln!(out);
        let _ = writeln!(out, "{banner}");
        let _ = writeln!(out, "Check results:");
        let _ = writeln!(out, "{banner}");
        let _ = writeln!(out);

        for result in &self.report.results {
            let symbol = match result.state() {
                CheckState::Passed => "✓",
                CheckState::Failed | CheckState::Error | CheckState::TimedOut => "✗",
                CheckState::Skipped => "○",
                CheckState::NotStarted | CheckState::Running => "?",
            };
            let _ = writeln!(
                out,
                "{symbol} {} [{}]",
                result.name(),
                result.state().to_string().to_uppercase()
            );
            let _ = writeln!(out, "  Duration: {:.2}s", result.duration_secs());
            if !result.message().is_empty() {
                let _ = writeln!(out, "  Message: {}", result.message());
            }
            if let Some(detail) = result.detail() {
                let _ = writeln!(out, "  Detail: {detail}");
            }
            if !result.artifacts().is_empty() {
                let _ = writeln!(out, "  Artifacts: {}", result.artifacts().len());
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "{banner}");
        out
    }

    /// Write `report.txt` and `report.json` into the run directory.
    pub fn write_artifacts(&self) -> Result<ReportPaths, ReportError> {
        let text_path = self.report.artifacts_dir.join(TEXT_REPORT_FILENAME);
        std::fs::write(&text_path, self.render_text()).map_err(|e| ReportError::Write {
            path: text_path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %text_path.display(), "text report written");

        let json_path = self.report.artifacts_dir.join(JSON_REPORT_FILENAME);
        let json = serde_json::to_string_pretty(&self.report)?;
        std::fs::write(&json_path, json).map_err(|e| ReportError::Write {
            path: json_path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %json_path.display(), "structured report written");

        Ok(ReportPaths {
            text: text_path,
            json: json_path,
        })
    }

    /// Dispatch configured notifications. Best-effort: every failure is
    /// logged and swallowed.
    pub async fn dispatch(&self, reporting: &ReportingConfig) {
        if reporting.webhook_url.is_none() && reporting.api_url.is_none() {
            return;
        }

        let client = match reqwest::Client::builder().timeout(DISPATCH_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "failed to build notification client, skipping dispatch");
                return;
            }
        };

        if let Some(url) = &reporting.webhook_url {
            let summary = self.report.summary();
            let payload = WebhookPayload::new(&self.report, &summary);
            match client.post(url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(url = %url, "run summary posted to webhook");
                }
                Ok(response) => {
                    tracing::warn!(url = %url, status = %response.status(), "webhook rejected run summary");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "failed to post run summary to webhook");
                }
            }
        }

        if let Some(url) = &reporting.api_url {
            let mut request = client.post(url).json(&self.report);
            if let Some(token) = &reporting.api_token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(url = %url, "full report posted to API");
                }
                Ok(response) => {
                    tracing::warn!(url = %url, status = %response.status(), "API rejected full report");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "failed to post full report to API");
                }
            }
        }
    }

    /// Remove run directories older than the retention window.
    ///
    /// A maintenance operation: nothing calls this implicitly. Returns
    /// the number of directories removed. Entries that cannot be
    /// inspected or removed are logged and left in place.
    pub fn prune_runs(artifacts_root: &Path, retention_days: u32) -> std::io::Result<usize> {
        if !artifacts_root.exists() {
            return Ok(0);
        }

        let max_age = Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);
        let now = std::time::SystemTime::now();
        let mut removed = 0;

        for entry in std::fs::read_dir(artifacts_root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(dir = %path.display(), error = %e, "cannot read run directory age, leaving in place");
                    continue;
                }
            };

            let expired = now
                .duration_since(modified)
                .map(|age| age > max_age)
                .unwrap_or(false);
            if !expired {
                continue;
            }

            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    tracing::info!(dir = %path.display(), "pruned expired run directory");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(dir = %path.display(), error = %e, "failed to prune run directory");
                }
            }
        }

        Ok(removed)
    }
}
