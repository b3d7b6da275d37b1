//! Common types, traits, errors, and configuration for hostcheck.
//!
//! This crate is the leaf of the workspace: the result state machine,
//! the check contract, the registry/loader, the suite configuration
//! model, and the shared error taxonomy. The execution engine and the
//! reporting pipeline live in `hostcheck-runner`; concrete checks live
//! in `hostcheck-checks`.

pub mod check;
pub mod config;
pub mod error;
pub mod registry;
pub mod result;

// --- Re-exports of the primary types ---

pub use check::{Check, CheckContext};
pub use config::{CheckEntry, GeneralConfig, ReportingConfig, RunConfig, SuiteConfig};
pub use error::{ConfigError, HostcheckError, LoadError, ReportError, StateError};
pub use registry::{CheckFactory, CheckRegistry, LoadedCheck};
pub use result::{CheckResult, CheckState, RunReport, RunSummary};
