//! Suite configuration: `hostcheck.toml` parsing and runtime settings.
//!
//! [`SuiteConfig`] is the top-level structure consumed by the engine and
//! the reporting pipeline. Loading order:
//! 1. TOML file
//! 2. Environment variable overrides (`HOSTCHECK_{SECTION}_{FIELD}`)
//! 3. Validation
//!
//! The configuration is structurally validated here; resolving each check
//! identifier and its options happens later in the loader, which is the
//! component that knows which checks exist.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HostcheckError, LoadError};

/// Top-level suite configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Display name of the suite; also used for run directory naming.
    pub suite_name: String,
    /// Logging settings.
    pub general: GeneralConfig,
    /// Run-level settings (budgets, artifacts root, retention).
    pub run: RunConfig,
    /// Ordered check entries.
    pub checks: Vec<CheckEntry>,
    /// Notification endpoints.
    pub reporting: ReportingConfig,
}

impl SuiteConfig {
    /// Load from a TOML file and apply environment variable overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HostcheckError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file without environment overrides.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HostcheckError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HostcheckError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HostcheckError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, HostcheckError> {
        toml::from_str(toml_str).map_err(|e| {
            HostcheckError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Apply environment variable overrides.
    ///
    /// Naming scheme: `HOSTCHECK_{SECTION}_{FIELD}`,
    /// e.g. `HOSTCHECK_RUN_ARTIFACTS_DIR=/var/lib/hostcheck`.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "HOSTCHECK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "HOSTCHECK_GENERAL_LOG_FORMAT");

        override_u64(
            &mut self.run.global_timeout_secs,
            "HOSTCHECK_RUN_GLOBAL_TIMEOUT_SECS",
        );
        override_string(&mut self.run.artifacts_dir, "HOSTCHECK_RUN_ARTIFACTS_DIR");
        override_u32(&mut self.run.retention_days, "HOSTCHECK_RUN_RETENTION_DAYS");

        override_opt_string(
            &mut self.reporting.webhook_url,
            "HOSTCHECK_REPORTING_WEBHOOK_URL",
        );
        override_opt_string(&mut self.reporting.api_url, "HOSTCHECK_REPORTING_API_URL");
        override_opt_string(
            &mut self.reporting.api_token,
            "HOSTCHECK_REPORTING_API_TOKEN",
        );
    }

    /// Validate structural configuration rules.
    ///
    /// Per-check timeout and option validation is the loader's job; this
    /// only rejects values the run as a whole cannot operate with.
    pub fn validate(&self) -> Result<(), HostcheckError> {
        if self.suite_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "suite_name".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.run.global_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "run.global_timeout_secs".to_owned(),
                reason: "must be greater than zero".to_owned(),
            }
            .into());
        }

        if self.checks.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "checks".to_owned(),
                reason: "at least one check entry is required".to_owned(),
            }
            .into());
        }

        for (idx, entry) in self.checks.iter().enumerate() {
            if entry.check.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("checks[{idx}].check"),
                    reason: "check identifier must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// The check entries that will actually run, in configured order.
    pub fn enabled_checks(&self) -> impl Iterator<Item = &CheckEntry> {
        self.checks.iter().filter(|entry| entry.enabled)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Whole-run time budget in seconds.
    pub global_timeout_secs: u64,
    /// Root directory under which per-run directories are created.
    pub artifacts_dir: String,
    /// Run directories older than this many days are eligible for pruning.
    pub retention_days: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            global_timeout_secs: 3600,
            artifacts_dir: "./artifacts".to_owned(),
            retention_days: 7,
        }
    }
}

/// One configured check: an opaque identifier plus options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckEntry {
    /// Check identifier resolved against the registry, e.g. `"network.http"`.
    pub check: String,
    /// Disabled entries are filtered out at load time and never produce
    /// a result.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-check timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause after this check completes, before the next one starts.
    #[serde(default)]
    pub delay_after_secs: u64,
    /// Check-specific options, interpreted by the check's factory.
    #[serde(flatten)]
    pub options: toml::Table,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

impl CheckEntry {
    /// Minimal entry with default timeout/enabled flags, mostly for tests
    /// and programmatic construction.
    pub fn new(check: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            enabled: true,
            timeout_secs: default_timeout_secs(),
            delay_after_secs: 0,
            options: toml::Table::new(),
        }
    }

    /// Look up a string option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Look up a non-negative integer option.
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options
            .get(key)
            .and_then(|v| v.as_integer())
            .and_then(|n| u64::try_from(n).ok())
    }

    /// Look up a boolean option.
    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// Look up an array-of-strings option. Non-string elements are
    /// rejected by returning `None`.
    pub fn option_str_list(&self, key: &str) -> Option<Vec<String>> {
        let array = self.options.get(key)?.as_array()?;
        array
            .iter()
            .map(|v| v.as_str().map(str::to_owned))
            .collect()
    }

    /// Require a string option, producing the loader error a factory
    /// should surface when it is absent.
    pub fn require_str(&self, key: &str) -> Result<&str, LoadError> {
        self.option_str(key).ok_or_else(|| LoadError::InvalidOption {
            identifier: self.check.clone(),
            field: key.to_owned(),
            reason: "required string option is missing".to_owned(),
        })
    }

    /// Build the loader error for an option that is present but unusable.
    pub fn invalid_option(&self, key: &str, reason: impl Into<String>) -> LoadError {
        LoadError::InvalidOption {
            identifier: self.check.clone(),
            field: key.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Notification endpoints. All optional; dispatch is best-effort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Webhook URL receiving the condensed run summary.
    pub webhook_url: Option<String>,
    /// API endpoint receiving the full structured report.
    pub api_url: Option<String>,
    /// Bearer token for the API endpoint.
    pub api_token: Option<String>,
}

// --- Environment override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = Some(val);
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn minimal_toml() -> &'static str {
        r#"
suite_name = "fleet smoke"

[[checks]]
check = "network.http"
urls = ["https://example.com"]
"#
    }

    #[test]
    fn default_sections_have_sane_values() {
        let config = SuiteConfig::parse(minimal_toml()).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.run.global_timeout_secs, 3600);
        assert_eq!(config.run.artifacts_dir, "./artifacts");
        assert_eq!(config.run.retention_days, 7);
        assert!(config.reporting.webhook_url.is_none());
    }

    #[test]
    fn check_entry_defaults() {
        let config = SuiteConfig::parse(minimal_toml()).unwrap();
        let entry = &config.checks[0];
        assert!(entry.enabled);
        assert_eq!(entry.timeout_secs, 300);
        assert_eq!(entry.delay_after_secs, 0);
    }

    #[test]
    fn full_toml_parses() {
        let toml_str = r#"
suite_name = "nightly fleet verification"

[general]
log_level = "debug"
log_format = "json"

[run]
global_timeout_secs = 1800
artifacts_dir = "/var/lib/hostcheck"
retention_days = 14

[reporting]
webhook_url = "https://hooks.example.com/abc"
api_url = "https://fleet.example.com/api/runs"
api_token = "secret"

[[checks]]
check = "network.http"
timeout_secs = 60
delay_after_secs = 2
urls = ["https://example.com", "https://example.org"]
url_timeout_secs = 5

[[checks]]
check = "host.command"
enabled = false
command = "systemctl"
args = ["is-active", "sshd"]
"#;
        let config = SuiteConfig::parse(toml_str).unwrap();
        assert_eq!(config.suite_name, "nightly fleet verification");
        assert_eq!(config.run.global_timeout_secs, 1800);
        assert_eq!(config.checks.len(), 2);
        assert_eq!(config.checks[0].timeout_secs, 60);
        assert_eq!(config.checks[0].delay_after_secs, 2);
        assert!(!config.checks[1].enabled);
        assert_eq!(
            config.reporting.webhook_url.as_deref(),
            Some("https://hooks.example.com/abc")
        );
    }

    #[test]
    fn check_specific_options_are_flattened() {
        let config = SuiteConfig::parse(minimal_toml()).unwrap();
        let entry = &config.checks[0];
        assert_eq!(
            entry.option_str_list("urls"),
            Some(vec!["https://example.com".to_owned()])
        );
        assert!(entry.option_str("missing").is_none());
    }

    #[test]
    fn option_accessors_reject_wrong_types() {
        let toml_str = r#"
suite_name = "s"

[[checks]]
check = "host.command"
command = "true"
attempts = 3
verbose = true
mixed = ["a", 1]
"#;
        let config = SuiteConfig::parse(toml_str).unwrap();
        let entry = &config.checks[0];
        assert_eq!(entry.option_str("command"), Some("true"));
        assert_eq!(entry.option_u64("attempts"), Some(3));
        assert_eq!(entry.option_bool("verbose"), Some(true));
        assert!(entry.option_str("attempts").is_none());
        assert!(entry.option_u64("command").is_none());
        // Array with a non-string element is rejected as a whole.
        assert!(entry.option_str_list("mixed").is_none());
    }

    #[test]
    fn require_str_reports_identifier_and_field() {
        let entry = CheckEntry::new("network.http");
        let err = entry.require_str("urls").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("network.http"));
        assert!(msg.contains("urls"));
    }

    #[test]
    fn invalid_toml_returns_parse_error() {
        let result = SuiteConfig::parse("suite_name = [[[nope");
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            HostcheckError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_suite_name() {
        let config = SuiteConfig::parse(
            r#"
suite_name = "  "

[[checks]]
check = "network.http"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("suite_name"));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = SuiteConfig::parse(minimal_toml()).unwrap();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = SuiteConfig::parse(minimal_toml()).unwrap();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_global_timeout() {
        let mut config = SuiteConfig::parse(minimal_toml()).unwrap();
        config.run.global_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("global_timeout_secs"));
    }

    #[test]
    fn validate_rejects_empty_check_list() {
        let config = SuiteConfig::parse(r#"suite_name = "s""#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one check"));
    }

    #[test]
    fn validate_rejects_empty_check_identifier() {
        let config = SuiteConfig::parse(
            r#"
suite_name = "s"

[[checks]]
check = ""
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("identifier"));
    }

    #[test]
    fn enabled_checks_filters_disabled_entries_in_order() {
        let config = SuiteConfig::parse(
            r#"
suite_name = "s"

[[checks]]
check = "a"

[[checks]]
check = "b"
enabled = false

[[checks]]
check = "c"
"#,
        )
        .unwrap();
        let enabled: Vec<&str> = config
            .enabled_checks()
            .map(|entry| entry.check.as_str())
            .collect();
        assert_eq!(enabled, vec!["a", "c"]);
    }

    #[test]
    #[serial]
    fn env_override_string_applies() {
        let mut config = SuiteConfig::parse(minimal_toml()).unwrap();
        // SAFETY: env mutation is confined to #[serial] tests.
        unsafe { std::env::set_var("HOSTCHECK_GENERAL_LOG_LEVEL", "debug") };
        config.apply_env_overrides();
        assert_eq!(config.general.log_level, "debug");
        unsafe { std::env::remove_var("HOSTCHECK_GENERAL_LOG_LEVEL") };
    }

    #[test]
    #[serial]
    fn env_override_u64_invalid_keeps_original() {
        let mut config = SuiteConfig::parse(minimal_toml()).unwrap();
        // SAFETY: env mutation is confined to #[serial] tests.
        unsafe { std::env::set_var("HOSTCHECK_RUN_GLOBAL_TIMEOUT_SECS", "not-a-number") };
        config.apply_env_overrides();
        assert_eq!(config.run.global_timeout_secs, 3600);
        unsafe { std::env::remove_var("HOSTCHECK_RUN_GLOBAL_TIMEOUT_SECS") };
    }

    #[test]
    #[serial]
    fn env_override_sets_optional_reporting_fields() {
        let mut config = SuiteConfig::parse(minimal_toml()).unwrap();
        // SAFETY: env mutation is confined to #[serial] tests.
        unsafe { std::env::set_var("HOSTCHECK_REPORTING_WEBHOOK_URL", "https://hooks.test/x") };
        config.apply_env_overrides();
        assert_eq!(
            config.reporting.webhook_url.as_deref(),
            Some("https://hooks.test/x")
        );
        unsafe { std::env::remove_var("HOSTCHECK_REPORTING_WEBHOOK_URL") };
    }

    #[test]
    fn config_serialize_round_trip() {
        let config = SuiteConfig::parse(minimal_toml()).unwrap();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = SuiteConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.suite_name, config.suite_name);
        assert_eq!(parsed.checks.len(), config.checks.len());
        assert_eq!(parsed.checks[0].check, config.checks[0].check);
        assert_eq!(
            parsed.run.global_timeout_secs,
            config.run.global_timeout_secs
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = SuiteConfig::from_file("/nonexistent/path/hostcheck.toml").await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            HostcheckError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn load_reads_file_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostcheck.toml");
        tokio::fs::write(&path, minimal_toml()).await.unwrap();
        let config = SuiteConfig::load(&path).await.unwrap();
        assert_eq!(config.suite_name, "fleet smoke");
    }
}
