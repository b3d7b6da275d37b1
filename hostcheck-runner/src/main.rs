use std::path::Path;

use clap::Parser;
use colored::Colorize;

use hostcheck_core::config::SuiteConfig;
use hostcheck_core::registry::CheckRegistry;

use hostcheck_runner::cli::{Cli, Command};
use hostcheck_runner::engine::Engine;
use hostcheck_runner::error::CliError;
use hostcheck_runner::logging;
use hostcheck_runner::report::Reporter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("hostcheck: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let Cli {
        log_level,
        log_format,
        command,
    } = cli;
    let overrides = LogOverrides {
        level: log_level,
        format: log_format,
    };

    match command {
        Command::Run {
            config,
            artifacts_dir,
        } => run_suite(&overrides, &config, artifacts_dir).await,
        Command::Validate { config } => validate_suite(&overrides, &config).await,
        Command::Prune {
            config,
            older_than_days,
        } => prune_runs(&overrides, &config, older_than_days).await,
    }
}

/// CLI flags that take precedence over the config file.
struct LogOverrides {
    level: Option<String>,
    format: Option<String>,
}

async fn load_config(
    path: &Path,
    overrides: &LogOverrides,
) -> Result<SuiteConfig, CliError> {
    let mut config = SuiteConfig::load(path).await?;
    if let Some(level) = &overrides.level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &overrides.format {
        config.general.log_format = format.clone();
    }
    config.validate()?;
    Ok(config)
}

fn builtin_registry() -> Result<CheckRegistry, CliError> {
    let mut registry = CheckRegistry::new();
    hostcheck_checks::register_builtins(&mut registry)
        .map_err(hostcheck_core::error::HostcheckError::from)?;
    Ok(registry)
}

async fn run_suite(
    overrides: &LogOverrides,
    config_path: &Path,
    artifacts_dir: Option<std::path::PathBuf>,
) -> Result<i32, CliError> {
    let mut config = load_config(config_path, overrides).await?;
    if let Some(dir) = artifacts_dir {
        config.run.artifacts_dir = dir.display().to_string();
    }
    logging::init_tracing(&config.general)?;

    tracing::info!(
        config = %config_path.display(),
        suite = %config.suite_name,
        "hostcheck starting"
    );

    let registry = builtin_registry()?;
    let mut engine = Engine::new(config.clone(), registry);

    // Interrupts request an orderly abort: the in-flight check finishes
    // or times out, the remainder is recorded as skipped, and the report
    // is still produced.
    let interrupt = engine.interrupt_token();
    tokio::spawn(async move {
        if let Some(signal) = wait_for_interrupt_signal().await {
            tracing::warn!(signal, "interrupt received, requesting abort");
            interrupt.cancel();
        }
    });

    let report = engine.run().await?;
    let reporter = Reporter::new(report);

    println!("{}", reporter.render_text());
    match reporter.write_artifacts() {
        Ok(paths) => {
            tracing::info!(
                text = %paths.text.display(),
                json = %paths.json.display(),
                "reports persisted"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to persist reports");
        }
    }
    reporter.dispatch(&config.reporting).await;

    let summary = reporter.report().summary();
    let aborted = reporter.report().aborted;
    // An aborted run exits non-zero even when every attempted check
    // passed: a truncated run must not read as green in a pipeline.
    let failed = aborted || summary.has_failures();
    let verdict = if failed {
        "FAILED".red().bold()
    } else {
        "PASSED".green().bold()
    };
    println!(
        "{verdict}: {}/{} checks passed ({})",
        summary.passed,
        summary.total,
        reporter.report().artifacts_dir.display()
    );

    Ok(if failed { 1 } else { 0 })
}

async fn validate_suite(overrides: &LogOverrides, config_path: &Path) -> Result<i32, CliError> {
    let config = load_config(config_path, overrides).await?;
    logging::init_tracing(&config.general)?;

    let registry = builtin_registry()?;
    let loaded = registry
        .load_suite(&config)
        .map_err(hostcheck_runner::engine::FatalError::from)?;

    println!(
        "configuration valid: suite '{}', {} enabled check(s)",
        config.suite_name,
        loaded.len()
    );
    Ok(0)
}

async fn prune_runs(
    overrides: &LogOverrides,
    config_path: &Path,
    older_than_days: Option<u32>,
) -> Result<i32, CliError> {
    let config = load_config(config_path, overrides).await?;
    logging::init_tracing(&config.general)?;

    let days = older_than_days.unwrap_or(config.run.retention_days);
    let removed = Reporter::prune_runs(Path::new(&config.run.artifacts_dir), days)?;
    println!("pruned {removed} run directories older than {days} days");
    Ok(0)
}

/// Wait for an interrupt signal (SIGINT or SIGTERM on unix, ctrl-c
/// elsewhere). Returns the signal name, or `None` if handlers could not
/// be installed.
async fn wait_for_interrupt_signal() -> Option<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                return None;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGINT handler");
                return None;
            }
        };

        Some(tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        })
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some("ctrl-c"),
            Err(e) => {
                tracing::warn!(error = %e, "failed to install ctrl-c handler");
                None
            }
        }
    }
}
