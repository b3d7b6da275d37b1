//! Check execution engine.
//!
//! The [`Engine`] loads the configured suite, then executes checks
//! strictly in configured order, one at a time. Concurrency exists only
//! to bound a single check's duration: each check runs on a dedicated
//! blocking worker awaited under a deadline, so a hung check can never
//! hang the run.
//!
//! # Run lifecycle
//!
//! ```text
//! Idle -> Running -> { Completed, Aborted, FatallyFailed }
//! ```
//!
//! `FatallyFailed` occurs only when the suite cannot be loaded or the
//! run's artifacts directory cannot be created; no results exist in that
//! case. `Aborted` occurs when an interrupt arrives mid-run or the global
//! time budget runs out: results produced so far are kept, the remaining
//! checks are recorded as skipped, and the report is still produced.
//!
//! # Timeout semantics
//!
//! Two independent deadlines apply: the per-check timeout (reset for each
//! check) and the global budget (monotonic from run start). A check is
//! awaited for `min(check timeout, remaining global budget)`. When the
//! bound elapses the check's cancellation token is cancelled and the
//! worker is abandoned; an eventual late result is discarded. Abandoned
//! work may keep consuming resources until the underlying operation
//! itself completes, which is the documented concession for arbitrary
//! blocking checks.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use hostcheck_core::check::CheckContext;
use hostcheck_core::config::SuiteConfig;
use hostcheck_core::error::LoadError;
use hostcheck_core::registry::{CheckRegistry, LoadedCheck};
use hostcheck_core::result::{slugify, CheckResult, CheckState, RunReport};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Aborted,
    FatallyFailed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
            Self::FatallyFailed => write!(f, "fatally_failed"),
        }
    }
}

/// Failures that prevent any check from being attempted. Everything else
/// is captured in the run report instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// The configured suite could not be resolved into check instances.
    #[error("failed to load check suite: {0}")]
    Load(#[from] LoadError),

    /// The run's artifacts directory could not be created.
    #[error("failed to create artifacts directory {path}: {source}")]
    Artifacts {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Message recorded on results for checks the run never reached.
const SKIP_MESSAGE: &str = "run aborted before execution";

/// Sequential check suite executor.
pub struct Engine {
    config: SuiteConfig,
    registry: CheckRegistry,
    interrupt: CancellationToken,
    state: RunState,
}

impl Engine {
    /// Create an engine for one run of the given suite.
    pub fn new(config: SuiteConfig, registry: CheckRegistry) -> Self {
        Self {
            config,
            registry,
            interrupt: CancellationToken::new(),
            state: RunState::Idle,
        }
    }

    /// Token an external signal handler cancels to request an orderly
    /// abort: the in-flight check finishes or times out under its own
    /// bound, the remainder is skipped.
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the suite to completion or abort.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError`] only for loader failure or inability to
    /// create the artifacts directory. Check failures, timeouts, and
    /// interrupts are recorded in the returned [`RunReport`] instead.
    pub async fn run(&mut self) -> Result<RunReport, FatalError> {
        self.transition(RunState::Running);
        let started_at = Utc::now();
        let run_started = Instant::now();

        let run_dir = match create_run_dir(&self.config) {
            Ok(dir) => dir,
            Err(e) => {
                self.transition(RunState::FatallyFailed);
                return Err(e);
            }
        };
        tracing::info!(dir = %run_dir.display(), "artifacts directory created");

        let loaded = match self.registry.load_suite(&self.config) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.transition(RunState::FatallyFailed);
                return Err(e.into());
            }
        };

        let global_budget = Duration::from_secs(self.config.run.global_timeout_secs);
        let deadline = run_started
            .checked_add(global_budget)
            .unwrap_or_else(|| run_started + Duration::from_secs(60 * 60 * 24 * 365));
        let total = loaded.len();
        let mut results = Vec::with_capacity(total);
        let mut aborted = false;

        tracing::info!(
            suite = %self.config.suite_name,
            checks = total,
            global_timeout_secs = global_budget.as_secs(),
            "starting check suite"
        );

        for (idx, entry) in loaded.into_iter().enumerate() {
            let name = entry.check.name().to_owned();
            let description = entry.check.description().to_owned();
            let delay_after = entry.delay_after;

            if aborted {
                tracing::warn!(check = %name, "skipping: {SKIP_MESSAGE}");
                results.push(CheckResult::skipped(&name, &description, SKIP_MESSAGE));
                continue;
            }

            tracing::info!(check = %name, position = idx + 1, total, "running check");
            let check_dir = check_artifacts_dir(&run_dir, idx, &name);
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (result, global_exhausted) =
                execute_check(entry, &check_dir, remaining, &self.interrupt).await;

            match result.state() {
                CheckState::Passed => {
                    tracing::info!(check = %name, "check passed: {}", result.message());
                }
                state => {
                    tracing::error!(check = %name, state = %state, "check did not pass: {}", result.message());
                }
            }
            results.push(result);

            // Nothing left to truncate after the final check; the run
            // counts as completed once every check was attempted.
            if idx + 1 == total {
                break;
            }

            if self.interrupt.is_cancelled() {
                tracing::warn!("interrupt requested, aborting remaining checks");
                aborted = true;
                continue;
            }
            if global_exhausted || Instant::now() >= deadline {
                tracing::warn!(
                    global_timeout_secs = global_budget.as_secs(),
                    "global time budget exhausted, aborting remaining checks"
                );
                aborted = true;
                continue;
            }

            if delay_after > Duration::ZERO {
                tracing::debug!(delay_secs = delay_after.as_secs(), "inter-check delay");
                tokio::select! {
                    _ = tokio::time::sleep(delay_after) => {}
                    _ = self.interrupt.cancelled() => {
                        tracing::warn!("interrupt requested during inter-check delay");
                        aborted = true;
                    }
                }
            }
        }

        self.transition(if aborted {
            RunState::Aborted
        } else {
            RunState::Completed
        });

        Ok(RunReport {
            run_id: Uuid::new_v4(),
            suite_name: self.config.suite_name.clone(),
            started_at,
            ended_at: Utc::now(),
            aborted,
            artifacts_dir: run_dir,
            results,
        })
    }

    fn transition(&mut self, to: RunState) {
        tracing::debug!(from = %self.state, to = %to, "run state transition");
        self.state = to;
    }
}

/// Run one check on a dedicated blocking worker, bounded by
/// `min(check timeout, remaining global budget)`.
///
/// Returns the terminal result plus whether the wait was cut short by the
/// global budget rather than the check's own timeout.
async fn execute_check(
    entry: LoadedCheck,
    check_dir: &Path,
    remaining_global: Duration,
    interrupt: &CancellationToken,
) -> (CheckResult, bool) {
    let name = entry.check.name().to_owned();
    let description = entry.check.description().to_owned();

    let mut placeholder = CheckResult::new(&name, &description);
    let _ = placeholder.mark_started();

    let bound = entry.timeout.min(remaining_global);
    let globally_bounded = remaining_global < entry.timeout;

    // Deriving the check's token from the interrupt token lets an
    // operator stop reach cooperative checks mid-flight as well.
    let ctx = CheckContext {
        artifacts_dir: check_dir.to_path_buf(),
        cancel: interrupt.child_token(),
    };
    let cancel = ctx.cancel.clone();
    let check = entry.check;
    let worker = tokio::task::spawn_blocking(move || check.run(&ctx));

    match tokio::time::timeout(bound, worker).await {
        Ok(Ok(reported)) => {
            if reported.state().is_terminal() {
                (reported, false)
            } else {
                tracing::error!(
                    check = %name,
                    state = %reported.state(),
                    "check returned a non-terminal result"
                );
                let _ = placeholder.mark_error("check did not report a terminal state", None);
                (placeholder, false)
            }
        }
        Ok(Err(join_err)) => {
            let detail = if join_err.is_panic() {
                format!("worker panicked: {join_err}")
            } else {
                join_err.to_string()
            };
            tracing::error!(check = %name, "check worker failed: {detail}");
            let _ = placeholder.mark_error("check execution panicked", Some(detail));
            (placeholder, false)
        }
        Err(_elapsed) => {
            // Cooperative stop for checks that honor it; the worker thread
            // itself is abandoned and its eventual result discarded.
            cancel.cancel();
            tracing::error!(
                check = %name,
                bound_secs = bound.as_secs(),
                configured_timeout_secs = entry.timeout.as_secs(),
                "check timed out, abandoning worker"
            );
            let _ = placeholder.mark_timed_out(entry.timeout);
            (placeholder, globally_bounded)
        }
    }
}

/// Create the unique per-run artifacts directory:
/// `{artifacts_root}/{suite_slug}_{YYYYmmdd_HHMMSS}`, with a numeric
/// suffix when two runs land in the same second.
fn create_run_dir(config: &SuiteConfig) -> Result<PathBuf, FatalError> {
    let root = PathBuf::from(&config.run.artifacts_dir);
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let base = format!("{}_{}", slugify(&config.suite_name), stamp);

    for attempt in 0..100u32 {
        let candidate = if attempt == 0 {
            root.join(&base)
        } else {
            root.join(format!("{base}_{attempt}"))
        };
        if candidate.exists() {
            continue;
        }
        return std::fs::create_dir_all(&candidate)
            .map(|()| candidate.clone())
            .map_err(|e| FatalError::Artifacts {
                path: candidate.display().to_string(),
                source: e,
            });
    }

    Err(FatalError::Artifacts {
        path: root.join(base).display().to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not find an unused run directory name",
        ),
    })
}

/// Per-check artifacts subdirectory inside the run directory. Falls back
/// to the run directory itself if creation fails, so the check still runs.
fn check_artifacts_dir(run_dir: &Path, idx: usize, name: &str) -> PathBuf {
    let dir = run_dir.join(format!("{:02}_{}", idx + 1, slugify(name)));
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            dir = %dir.display(),
            error = %e,
            "failed to create check artifacts directory, using run directory"
        );
        return run_dir.to_path_buf();
    }
    dir
}
