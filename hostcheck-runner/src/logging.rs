//! Logging initialization for the hostcheck binary.
//!
//! Configures `tracing-subscriber` from the `[general]` section of the
//! suite configuration. Supports JSON structured logging and a
//! human-readable pretty format.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hostcheck_core::config::GeneralConfig;
use hostcheck_core::error::{ConfigError, HostcheckError};

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Formats
///
/// * `"pretty"` - Human-readable output (default)
/// * `"json"` - Machine-parseable JSON lines for unattended runs
pub fn init_tracing(config: &GeneralConfig) -> Result<(), HostcheckError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "general.log_format".to_owned(),
                    reason: format!("failed to initialize JSON subscriber: {e}"),
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "general.log_format".to_owned(),
                    reason: format!("failed to initialize pretty subscriber: {e}"),
                })?;
        }
        other => {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown log format '{other}', expected 'json' or 'pretty'"),
            }
            .into());
        }
    }

    Ok(())
}
