//! Check result state machine and run-level report types.
//!
//! A [`CheckResult`] records the outcome of a single check. Transitions are
//! forward-only and write-once:
//!
//! ```text
//! NotStarted -> mark_started() -> Running -> one terminal state
//! NotStarted -> mark_skipped() -> Skipped
//! ```
//!
//! Terminal states are `Passed`, `Failed`, `Error`, `TimedOut`, `Skipped`.
//! Once a result is terminal it never changes; further transition requests
//! fail with [`StateError`] and leave the result untouched.
//!
//! Timestamp invariant: `ended_at` is set if and only if the state is
//! terminal, and `started_at` is set if and only if the state is `Running`
//! or terminal. A skipped result carries equal start and end stamps so every
//! terminal result is fully stamped.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StateError;

// ─── CheckState ──────────────────────────────────────────────────────

/// Lifecycle state of a single check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Created, not yet handed to a worker.
    NotStarted,
    /// Currently executing.
    Running,
    /// The check reported its expectations were met.
    Passed,
    /// The check reported its expectations were not met.
    Failed,
    /// The check (or the engine on its behalf) hit an unexpected condition.
    Error,
    /// The check did not return within its effective timeout.
    TimedOut,
    /// The check was never attempted because the run was aborted.
    Skipped,
}

impl CheckState {
    /// Whether this state ends a result's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Passed | Self::Failed | Self::Error | Self::TimedOut | Self::Skipped
        )
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running => write!(f, "running"),
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Error => write!(f, "error"),
            Self::TimedOut => write!(f, "timed_out"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

// ─── CheckResult ─────────────────────────────────────────────────────

/// The record of one check's outcome within a run.
///
/// Fields are private so that every mutation goes through the transition
/// operations, which enforce the forward-only/write-once contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    name: String,
    description: String,
    state: CheckState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    message: String,
    detail: Option<String>,
    artifacts: Vec<PathBuf>,
}

impl CheckResult {
    /// Create a fresh result in `NotStarted`.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            state: CheckState::NotStarted,
            started_at: None,
            ended_at: None,
            message: String::new(),
            detail: None,
            artifacts: Vec::new(),
        }
    }

    /// Build an already-skipped result, used by the engine for checks that
    /// were never attempted.
    pub fn skipped(
        name: impl Into<String>,
        description: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let mut result = Self::new(name, description);
        // Cannot fail on a fresh result.
        let _ = result.mark_skipped(reason);
        result
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Wall-clock duration between start and end, zero until both are set.
    pub fn duration_secs(&self) -> f64 {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => {
                let millis = (end - start).num_milliseconds().max(0);
                millis as f64 / 1000.0
            }
            _ => 0.0,
        }
    }

    /// Record a file produced by this check (screenshot, captured output).
    pub fn add_artifact(&mut self, path: impl Into<PathBuf>) {
        self.artifacts.push(path.into());
    }

    /// Transition `NotStarted -> Running` and stamp `started_at`.
    pub fn mark_started(&mut self) -> Result<(), StateError> {
        self.guard(CheckState::NotStarted, CheckState::Running)?;
        self.state = CheckState::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Transition `Running -> Passed`.
    pub fn mark_passed(&mut self, message: impl Into<String>) -> Result<(), StateError> {
        self.terminate(CheckState::Passed, message.into(), None)
    }

    /// Transition `Running -> Failed`. `Failed` means the check itself
    /// determined its expectations were not met.
    pub fn mark_failed(
        &mut self,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Result<(), StateError> {
        self.terminate(CheckState::Failed, message.into(), detail)
    }

    /// Transition `Running -> Error`. `Error` means execution hit an
    /// unexpected condition, as opposed to a check-reported failure.
    pub fn mark_error(
        &mut self,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Result<(), StateError> {
        self.terminate(CheckState::Error, message.into(), detail)
    }

    /// Transition `Running -> TimedOut`, naming the configured timeout.
    pub fn mark_timed_out(&mut self, configured_timeout: Duration) -> Result<(), StateError> {
        let message = format!(
            "check did not complete within the configured timeout of {}s",
            configured_timeout.as_secs()
        );
        self.terminate(CheckState::TimedOut, message, None)
    }

    /// Transition `NotStarted -> Skipped` for checks that were never
    /// attempted. Start and end stamps are set to the same instant.
    pub fn mark_skipped(&mut self, reason: impl Into<String>) -> Result<(), StateError> {
        self.guard(CheckState::NotStarted, CheckState::Skipped)?;
        let now = Utc::now();
        self.state = CheckState::Skipped;
        self.started_at = Some(now);
        self.ended_at = Some(now);
        self.message = reason.into();
        Ok(())
    }

    fn terminate(
        &mut self,
        to: CheckState,
        message: String,
        detail: Option<String>,
    ) -> Result<(), StateError> {
        self.guard(CheckState::Running, to)?;
        self.state = to;
        self.ended_at = Some(Utc::now());
        self.message = message;
        self.detail = detail;
        Ok(())
    }

    fn guard(&self, expected: CheckState, to: CheckState) -> Result<(), StateError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(StateError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            })
        }
    }
}

// ─── RunReport ───────────────────────────────────────────────────────

/// The complete outcome of one suite run: ordered results plus run-level
/// metadata. Assembled once by the execution engine and handed immutably
/// to the reporting pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id for this run.
    pub run_id: Uuid,
    /// Suite name from configuration.
    pub suite_name: String,
    /// When execution began.
    pub started_at: DateTime<Utc>,
    /// When execution finished (abort included).
    pub ended_at: DateTime<Utc>,
    /// True if the run was truncated by an interrupt or the global timeout.
    pub aborted: bool,
    /// Per-run artifacts directory.
    pub artifacts_dir: PathBuf,
    /// One result per configured (enabled) check, in execution order.
    pub results: Vec<CheckResult>,
}

impl RunReport {
    /// Derive aggregate counts from the results.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.results.len(),
            duration_secs: (self.ended_at - self.started_at).num_milliseconds().max(0) as f64
                / 1000.0,
            ..RunSummary::default()
        };
        for result in &self.results {
            match result.state() {
                CheckState::Passed => summary.passed += 1,
                CheckState::Failed => summary.failed += 1,
                CheckState::Error => summary.errors += 1,
                CheckState::TimedOut => summary.timed_out += 1,
                CheckState::Skipped => summary.skipped += 1,
                CheckState::NotStarted | CheckState::Running => {}
            }
        }
        if summary.total > 0 {
            summary.pass_rate = summary.passed as f64 / summary.total as f64 * 100.0;
        }
        summary
    }
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub timed_out: usize,
    pub skipped: usize,
    /// Percentage of results in `Passed`, 0.0 for an empty run.
    pub pass_rate: f64,
    pub duration_secs: f64,
}

impl RunSummary {
    /// Whether any result ended in `Failed`, `Error`, or `TimedOut`.
    pub fn has_failures(&self) -> bool {
        self.failed + self.errors + self.timed_out > 0
    }
}

/// Build a filesystem-safe slug from a display name.
///
/// Lowercases and replaces anything outside `[a-z0-9-_]` with underscores,
/// so suite and check names map to predictable directory names.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────
