//! The contract every runnable check implements.
//!
//! A check is an opaque, potentially slow, potentially blocking operation.
//! The engine executes `run()` on a dedicated worker thread under a
//! deadline; a check that supports cooperative cancellation should poll
//! [`CheckContext::is_cancelled`] at convenient points and return early.
//! Checks that cannot be cancelled are simply abandoned when their deadline
//! expires, and their eventual result is discarded.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::result::CheckResult;

/// A single runnable verification check.
///
/// Implementations construct and return a terminal [`CheckResult`]; the
/// engine treats a returned result that never reached a terminal state as
/// an execution error.
pub trait Check: Send {
    /// Stable check name, used in results and artifact paths.
    fn name(&self) -> &str;

    /// Human-readable description of what the check verifies.
    fn description(&self) -> &str;

    /// Execute the check. May block; runs on a dedicated worker thread.
    fn run(&self, ctx: &CheckContext) -> CheckResult;
}

/// Per-execution context handed to a check by the engine.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Directory reserved for this check's artifact files. Created by the
    /// engine before the check runs; no two checks in a run share one.
    pub artifacts_dir: PathBuf,
    /// Cancelled by the engine when the check's deadline expires or the
    /// run is interrupted.
    pub cancel: CancellationToken,
}

impl CheckContext {
    /// Create a context rooted at the given artifacts directory.
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Whether the engine has requested this check to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Path for an artifact file inside this check's directory.
    pub fn artifact_path(&self, filename: &str) -> PathBuf {
        self.artifacts_dir.join(filename)
    }
}

impl AsRef<Path> for CheckContext {
    fn as_ref(&self) -> &Path {
        &self.artifacts_dir
    }
}
