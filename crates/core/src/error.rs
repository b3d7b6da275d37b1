//! Error types shared across the hostcheck crates.

/// Top-level hostcheck error type.
#[derive(Debug, thiserror::Error)]
pub enum HostcheckError {
    /// Configuration loading or validation failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Check suite loading failure.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Result state-machine contract violation.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Report rendering or persistence failure.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration file is not valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A field holds a value the suite cannot run with.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors raised while resolving configured check entries into runnable
/// check instances. All of these are fatal: the run aborts before any
/// check is attempted.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The configuration names a check identifier no factory is registered for.
    #[error("unknown check identifier: {identifier}")]
    UnknownCheck { identifier: String },

    /// A factory was registered twice under the same identifier.
    #[error("check factory already registered: {identifier}")]
    DuplicateFactory { identifier: String },

    /// A check entry carries a timeout the engine cannot enforce.
    #[error("invalid timeout for check '{identifier}': {reason}")]
    InvalidTimeout { identifier: String, reason: String },

    /// A check-specific option is missing or malformed.
    #[error("invalid option '{field}' for check '{identifier}': {reason}")]
    InvalidOption {
        identifier: String,
        field: String,
        reason: String,
    },
}

/// A result state-machine violation.
///
/// Transitions are forward-only and terminal states are write-once; any
/// other transition request fails with this error. The execution engine
/// downgrades it to an `Error` result rather than letting it crash the run.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The requested transition is not permitted from the current state.
    #[error("invalid result transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Report persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Writing a report artifact to disk failed.
    #[error("failed to write report artifact {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the run report failed.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
