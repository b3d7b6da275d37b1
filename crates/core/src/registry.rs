//! Check registry and suite loader.
//!
//! Check identifiers in configuration are resolved through an explicit
//! registry of factory functions populated at startup. No runtime
//! reflection: a check exists if and only if a factory was registered
//! for its identifier.
//!
//! Loading is fail-fast. The whole ordered list is resolved and
//! instantiated before execution begins, so a configuration error aborts
//! the run before any check is attempted.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::check::Check;
use crate::config::{CheckEntry, SuiteConfig};
use crate::error::LoadError;

/// Factory resolving one configuration entry into a check instance.
pub type CheckFactory =
    Box<dyn Fn(&CheckEntry) -> Result<Box<dyn Check>, LoadError> + Send + Sync>;

/// A check instance bound to its execution parameters, ready to run.
pub struct LoadedCheck {
    /// The instantiated check.
    pub check: Box<dyn Check>,
    /// Per-check timeout.
    pub timeout: Duration,
    /// Pause applied after this check completes.
    pub delay_after: Duration,
}

impl std::fmt::Debug for LoadedCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedCheck")
            .field("check", &self.check.name())
            .field("timeout", &self.timeout)
            .field("delay_after", &self.delay_after)
            .finish()
    }
}

/// Registry mapping check identifiers to factories.
pub struct CheckRegistry {
    factories: BTreeMap<String, CheckFactory>,
}

impl CheckRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory under an identifier.
    ///
    /// Registering the same identifier twice is an error.
    pub fn register<F>(&mut self, identifier: &str, factory: F) -> Result<(), LoadError>
    where
        F: Fn(&CheckEntry) -> Result<Box<dyn Check>, LoadError> + Send + Sync + 'static,
    {
        if self.factories.contains_key(identifier) {
            return Err(LoadError::DuplicateFactory {
                identifier: identifier.to_owned(),
            });
        }
        self.factories
            .insert(identifier.to_owned(), Box::new(factory));
        Ok(())
    }

    /// Whether a factory is registered for the identifier.
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// All registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Number of registered factories.
    pub fn count(&self) -> usize {
        self.factories.len()
    }

    /// Resolve every enabled entry of the suite into a [`LoadedCheck`].
    ///
    /// Disabled entries are filtered out here and never become instances
    /// nor appear in the run report. The first unresolvable identifier,
    /// invalid timeout, or rejected option aborts the whole load.
    pub fn load_suite(&self, config: &SuiteConfig) -> Result<Vec<LoadedCheck>, LoadError> {
        let mut loaded = Vec::new();

        for entry in &config.checks {
            if !entry.enabled {
                tracing::debug!(check = %entry.check, "skipping disabled check entry");
                continue;
            }

            let factory =
                self.factories
                    .get(&entry.check)
                    .ok_or_else(|| LoadError::UnknownCheck {
                        identifier: entry.check.clone(),
                    })?;

            if entry.timeout_secs == 0 {
                return Err(LoadError::InvalidTimeout {
                    identifier: entry.check.clone(),
                    reason: "timeout must be greater than zero".to_owned(),
                });
            }

            let check = factory(entry)?;
            loaded.push(LoadedCheck {
                check,
                timeout: Duration::from_secs(entry.timeout_secs),
                delay_after: Duration::from_secs(entry.delay_after_secs),
            });
        }

        tracing::info!(
            total = config.checks.len(),
            loaded = loaded.len(),
            "check suite loaded"
        );
        Ok(loaded)
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckContext;
    use crate::result::CheckResult;

    struct NamedCheck {
        name: String,
    }

    impl Check for NamedCheck {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "test check"
        }

        fn run(&self, _ctx: &CheckContext) -> CheckResult {
            let mut result = CheckResult::new(self.name(), self.description());
            let _ = result.mark_started();
            let _ = result.mark_passed("ok");
            result
        }
    }

    fn registry_with(ids: &[&str]) -> CheckRegistry {
        let mut registry = CheckRegistry::new();
        for id in ids {
            let owned = (*id).to_owned();
            registry
                .register(id, move |_entry| {
                    Ok(Box::new(NamedCheck {
                        name: owned.clone(),
                    }) as Box<dyn Check>)
                })
                .unwrap();
        }
        registry
    }

    fn suite_with(entries: Vec<CheckEntry>) -> SuiteConfig {
        SuiteConfig {
            suite_name: "test suite".to_owned(),
            checks: entries,
            ..SuiteConfig::default()
        }
    }

    #[test]
    fn empty_registry_has_no_identifiers() {
        let registry = CheckRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.identifiers().is_empty());
        assert!(!registry.contains("anything"));
    }

    #[test]
    fn register_duplicate_identifier_fails() {
        let mut registry = registry_with(&["dup"]);
        let err = registry
            .register("dup", |_entry| {
                Ok(Box::new(NamedCheck {
                    name: "dup".to_owned(),
                }) as Box<dyn Check>)
            })
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn identifiers_are_sorted() {
        let registry = registry_with(&["zeta", "alpha", "mid"]);
        assert_eq!(registry.identifiers(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn load_suite_preserves_configured_order() {
        let registry = registry_with(&["a", "b", "c"]);
        let suite = suite_with(vec![
            CheckEntry::new("c"),
            CheckEntry::new("a"),
            CheckEntry::new("b"),
        ]);

        let loaded = registry.load_suite(&suite).unwrap();
        let names: Vec<&str> = loaded.iter().map(|l| l.check.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn load_suite_filters_disabled_entries() {
        let registry = registry_with(&["a", "b"]);
        let mut disabled = CheckEntry::new("b");
        disabled.enabled = false;
        let suite = suite_with(vec![CheckEntry::new("a"), disabled]);

        let loaded = registry.load_suite(&suite).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].check.name(), "a");
    }

    #[test]
    fn load_suite_fails_fast_on_unknown_identifier() {
        let registry = registry_with(&["a"]);
        let suite = suite_with(vec![CheckEntry::new("a"), CheckEntry::new("ghost")]);

        let err = registry.load_suite(&suite).unwrap_err();
        assert!(matches!(err, LoadError::UnknownCheck { identifier } if identifier == "ghost"));
    }

    #[test]
    fn load_suite_rejects_zero_timeout() {
        let registry = registry_with(&["a"]);
        let mut entry = CheckEntry::new("a");
        entry.timeout_secs = 0;
        let suite = suite_with(vec![entry]);

        let err = registry.load_suite(&suite).unwrap_err();
        assert!(matches!(err, LoadError::InvalidTimeout { .. }));
    }

    #[test]
    fn disabled_entry_with_unknown_identifier_does_not_fail_load() {
        // Disabled entries are filtered before resolution.
        let registry = registry_with(&["a"]);
        let mut ghost = CheckEntry::new("ghost");
        ghost.enabled = false;
        let suite = suite_with(vec![CheckEntry::new("a"), ghost]);

        let loaded = registry.load_suite(&suite).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn load_suite_propagates_factory_option_errors() {
        let mut registry = CheckRegistry::new();
        registry
            .register("needs.option", |entry| {
                entry.require_str("target")?;
                Ok(Box::new(NamedCheck {
                    name: "needs.option".to_owned(),
                }) as Box<dyn Check>)
            })
            .unwrap();
        let suite = suite_with(vec![CheckEntry::new("needs.option")]);

        let err = registry.load_suite(&suite).unwrap_err();
        assert!(matches!(err, LoadError::InvalidOption { .. }));
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn loaded_check_carries_entry_durations() {
        let registry = registry_with(&["a"]);
        let mut entry = CheckEntry::new("a");
        entry.timeout_secs = 42;
        entry.delay_after_secs = 3;
        let suite = suite_with(vec![entry]);

        let loaded = registry.load_suite(&suite).unwrap();
        assert_eq!(loaded[0].timeout, Duration::from_secs(42));
        assert_eq!(loaded[0].delay_after, Duration::from_secs(3));
    }
}
