//! CLI argument definitions for the hostcheck binary.
//!
//! Uses `clap` v4 derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Hostcheck: unattended verification check suites against a live host.
///
/// Runs the checks configured in `hostcheck.toml` strictly in order,
/// enforcing per-check and whole-run time budgets, and writes text and
/// JSON reports under the artifacts directory.
#[derive(Parser, Debug)]
#[command(name = "hostcheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute the configured check suite.
    Run {
        /// Path to the suite configuration file.
        #[arg(short, long, default_value = "hostcheck.toml")]
        config: PathBuf,

        /// Override the artifacts root directory.
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
    },

    /// Validate the configuration and resolve every check identifier,
    /// without running anything.
    Validate {
        /// Path to the suite configuration file.
        #[arg(short, long, default_value = "hostcheck.toml")]
        config: PathBuf,
    },

    /// Remove run directories older than the retention window.
    Prune {
        /// Path to the suite configuration file.
        #[arg(short, long, default_value = "hostcheck.toml")]
        config: PathBuf,

        /// Override the configured retention window in days.
        #[arg(long)]
        older_than_days: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_subcommand_parses_with_defaults() {
        let cli = Cli::try_parse_from(["hostcheck", "run"]).unwrap();
        match cli.command {
            Command::Run {
                config,
                artifacts_dir,
            } => {
                assert_eq!(config, PathBuf::from("hostcheck.toml"));
                assert!(artifacts_dir.is_none());
            }
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn run_subcommand_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "hostcheck",
            "--log-level",
            "debug",
            "run",
            "--config",
            "/etc/hostcheck/suite.toml",
            "--artifacts-dir",
            "/tmp/artifacts",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Run {
                config,
                artifacts_dir,
            } => {
                assert_eq!(config, PathBuf::from("/etc/hostcheck/suite.toml"));
                assert_eq!(artifacts_dir, Some(PathBuf::from("/tmp/artifacts")));
            }
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn prune_subcommand_parses_retention_override() {
        let cli =
            Cli::try_parse_from(["hostcheck", "prune", "--older-than-days", "30"]).unwrap();
        match cli.command {
            Command::Prune {
                older_than_days, ..
            } => assert_eq!(older_than_days, Some(30)),
            _ => panic!("expected prune subcommand"),
        }
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["hostcheck"]).is_err());
    }
}
