//! Process presence check.
//!
//! Verifies a named process is running, optionally waiting for it to
//! appear. Matching is delegated to `pgrep -x`, the same probe the
//! original fleet tooling used.

use std::process::Command;
use std::time::{Duration, Instant};

use hostcheck_core::check::{Check, CheckContext};
use hostcheck_core::config::CheckEntry;
use hostcheck_core::error::LoadError;
use hostcheck_core::result::CheckResult;

/// Registry identifier for this check.
pub const IDENTIFIER: &str = "host.process";

/// Poll interval while waiting for a process to appear.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Asserts a named process is running.
#[derive(Debug)]
pub struct ProcessCheck {
    process: String,
    wait_secs: u64,
}

impl ProcessCheck {
    /// Build from a configuration entry.
    ///
    /// Required option: `process` (exact process name). Optional:
    /// `wait_secs` (keep polling this long before giving up, default 0).
    pub fn from_entry(entry: &CheckEntry) -> Result<Self, LoadError> {
        let process = entry.require_str("process")?.to_owned();
        Ok(Self {
            process,
            wait_secs: entry.option_u64("wait_secs").unwrap_or(0),
        })
    }

    fn is_running(&self) -> Result<bool, std::io::Error> {
        let output = Command::new("pgrep")
            .arg("-x")
            .arg(&self.process)
            .output()?;
        Ok(output.status.success())
    }
}

impl Check for ProcessCheck {
    fn name(&self) -> &str {
        IDENTIFIER
    }

    fn description(&self) -> &str {
        "Verifies a named process is running"
    }

    fn run(&self, ctx: &CheckContext) -> CheckResult {
        let mut result = CheckResult::new(self.name(), self.description());
        let _ = result.mark_started();

        let deadline = Instant::now() + Duration::from_secs(self.wait_secs);
        loop {
            match self.is_running() {
                Ok(true) => {
                    let _ = result.mark_passed(format!("process '{}' is running", self.process));
                    return result;
                }
                Ok(false) => {}
                Err(e) => {
                    let _ = result.mark_error("failed to probe processes", Some(e.to_string()));
                    return result;
                }
            }

            if ctx.is_cancelled() || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
        }

        let _ = result.mark_failed(
            format!("process '{}' is not running", self.process),
            if self.wait_secs > 0 {
                Some(format!("waited {}s for it to appear", self.wait_secs))
            } else {
                None
            },
        );
        result
    }
}
