//! CLI-specific error type and exit code mapping.

use hostcheck_core::error::HostcheckError;

use crate::engine::FatalError;

/// Errors surfaced directly to the invoking shell, before or instead of
/// a run report. Everything that happens after execution has started is
/// captured in the report rather than raised here.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(#[from] HostcheckError),

    /// The engine could not attempt any check.
    #[error("{0}")]
    Fatal(#[from] FatalError),

    /// IO error from a maintenance command.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                             |
    /// |------|-----------------------------------------------------|
    /// | 0    | Every attempted check passed, run completed         |
    /// | 1    | Check failures, or run aborted, or command error    |
    /// | 2    | Fatal error before any check could be attempted     |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Fatal(_) => 2,
            Self::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcheck_core::error::{ConfigError, LoadError};

    #[test]
    fn config_error_maps_to_exit_code_2() {
        let err = CliError::Config(HostcheckError::Config(ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn fatal_load_error_maps_to_exit_code_2() {
        let err = CliError::Fatal(FatalError::Load(LoadError::UnknownCheck {
            identifier: "ghost".to_owned(),
        }));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn io_error_maps_to_exit_code_1() {
        let err = CliError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.exit_code(), 1);
    }
}
