//! Command execution check.
//!
//! Runs a configured command and verifies its exit status. Captured
//! stdout/stderr are written into the check's artifacts directory so a
//! failing run leaves the raw output behind for diagnosis.

use std::fs;
use std::process::Command;

use hostcheck_core::check::{Check, CheckContext};
use hostcheck_core::config::CheckEntry;
use hostcheck_core::error::LoadError;
use hostcheck_core::result::CheckResult;

/// Registry identifier for this check.
pub const IDENTIFIER: &str = "host.command";

/// Runs a command and asserts on its exit status.
#[derive(Debug)]
pub struct CommandCheck {
    command: String,
    args: Vec<String>,
    expect_status: i32,
}

impl CommandCheck {
    /// Build from a configuration entry.
    ///
    /// Required option: `command`. Optional: `args` (array of strings),
    /// `expect_status` (default 0).
    pub fn from_entry(entry: &CheckEntry) -> Result<Self, LoadError> {
        let command = entry.require_str("command")?.to_owned();

        let args = match entry.options.get("args") {
            None => Vec::new(),
            Some(_) => entry
                .option_str_list("args")
                .ok_or_else(|| entry.invalid_option("args", "must be an array of strings"))?,
        };

        let expect_status = match entry.option_u64("expect_status") {
            None if entry.options.contains_key("expect_status") => {
                return Err(entry.invalid_option("expect_status", "must be a non-negative integer"));
            }
            None => 0,
            Some(n) => i32::try_from(n)
                .map_err(|_| entry.invalid_option("expect_status", "out of range for an exit status"))?,
        };

        Ok(Self {
            command,
            args,
            expect_status,
        })
    }

    fn command_line(&self) -> String {
        let mut line = self.command.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl Check for CommandCheck {
    fn name(&self) -> &str {
        IDENTIFIER
    }

    fn description(&self) -> &str {
        "Runs a command and verifies its exit status"
    }

    fn run(&self, ctx: &CheckContext) -> CheckResult {
        let mut result = CheckResult::new(self.name(), self.description());
        let _ = result.mark_started();

        tracing::debug!(command = %self.command_line(), "running command");
        let output = match Command::new(&self.command).args(&self.args).output() {
            Ok(output) => output,
            Err(e) => {
                let _ = result.mark_error(
                    format!("failed to spawn '{}'", self.command),
                    Some(e.to_string()),
                );
                return result;
            }
        };

        // Keep the raw output next to the result regardless of verdict.
        let mut transcript = format!("$ {}\n", self.command_line());
        if !output.stdout.is_empty() {
            transcript.push_str(&String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            transcript.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        let artifact = ctx.artifact_path("output.txt");
        match fs::write(&artifact, &transcript) {
            Ok(()) => result.add_artifact(&artifact),
            Err(e) => {
                tracing::warn!(path = %artifact.display(), error = %e, "failed to write command output artifact");
            }
        }

        let status = output.status.code();
        if status == Some(self.expect_status) {
            let _ = result.mark_passed(format!(
                "'{}' exited with expected status {}",
                self.command, self.expect_status
            ));
        } else {
            let stderr_snippet: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(500)
                .collect();
            let _ = result.mark_failed(
                format!(
                    "'{}' exited with status {}, expected {}",
                    self.command,
                    status.map_or_else(|| "signal".to_owned(), |c| c.to_string()),
                    self.expect_status
                ),
                if stderr_snippet.is_empty() {
                    None
                } else {
                    Some(stderr_snippet)
                },
            );
        }
        result
    }
}
