//! Data-only store configuration.

use crate::persist::{DEFAULT_STORAGE_KEY, DEFAULT_THROTTLE_WINDOW};
use crate::store::error::{BuildError, ConfigViolation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Default interval between handshake broadcasts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Store options that can be read from a config file.
///
/// Callbacks (undo/redo hooks, initializer, effects) and the storage backend
/// are set on the builder.
///
/// # Example
///
/// ```rust
/// use rewind::store::StoreConfig;
///
/// let config = StoreConfig::from_json(r#"{ "log": true, "local_storage_key": "editor" }"#).unwrap();
/// assert!(config.log);
/// assert_eq!(config.local_storage_key, "editor");
/// assert_eq!(config.throttle_window_ms, 5000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Emit an info trace for every dispatch, undo, redo, reset and reinitialize
    pub log: bool,
    /// Persist the current snapshot to the configured storage
    pub use_local_storage: bool,
    /// Storage key the snapshot is written under
    pub local_storage_key: String,
    /// Minimum time between persistence writes
    pub throttle_window_ms: u64,
    /// Time between handshake broadcasts
    pub retry_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log: false,
            use_local_storage: false,
            local_storage_key: DEFAULT_STORAGE_KEY.to_string(),
            throttle_window_ms: DEFAULT_THROTTLE_WINDOW.as_millis() as u64,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL.as_millis() as u64,
        }
    }
}

impl StoreConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Check the configuration, accumulating every violation.
    pub fn validate(&self, has_storage: bool) -> Result<(), BuildError> {
        let checks: Vec<Validation<(), NonEmptyVec<ConfigViolation>>> = vec![
            require(
                !self.use_local_storage || !self.local_storage_key.is_empty(),
                ConfigViolation::EmptyStorageKey,
            ),
            require(
                !self.use_local_storage || self.throttle_window_ms > 0,
                ConfigViolation::ZeroThrottleWindow,
            ),
            require(self.retry_interval_ms > 0, ConfigViolation::ZeroRetryInterval),
            require(
                !self.use_local_storage || has_storage,
                ConfigViolation::MissingStorage,
            ),
        ];

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => {
                Err(BuildError::InvalidConfig(errors.iter().cloned().collect()))
            }
        }
    }
}

fn require(ok: bool, violation: ConfigViolation) -> Validation<(), NonEmptyVec<ConfigViolation>> {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = StoreConfig::default();
        assert!(!config.log);
        assert!(!config.use_local_storage);
        assert_eq!(config.local_storage_key, "redo-state");
        assert_eq!(config.throttle_window(), Duration::from_secs(5));
        assert_eq!(config.retry_interval(), Duration::from_secs(1));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = StoreConfig::from_json("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn config_serializes_correctly() {
        let config = StoreConfig {
            use_local_storage: true,
            throttle_window_ms: 250,
            ..StoreConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(StoreConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn default_config_is_valid_without_storage() {
        assert!(StoreConfig::default().validate(false).is_ok());
    }

    #[test]
    fn validate_accumulates_all_violations() {
        let config = StoreConfig {
            use_local_storage: true,
            local_storage_key: String::new(),
            throttle_window_ms: 0,
            retry_interval_ms: 0,
            ..StoreConfig::default()
        };

        match config.validate(false) {
            Err(BuildError::InvalidConfig(violations)) => {
                assert_eq!(
                    violations,
                    vec![
                        ConfigViolation::EmptyStorageKey,
                        ConfigViolation::ZeroThrottleWindow,
                        ConfigViolation::ZeroRetryInterval,
                        ConfigViolation::MissingStorage,
                    ]
                );
            }
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn storage_settings_ignored_when_persistence_off() {
        let config = StoreConfig {
            local_storage_key: String::new(),
            throttle_window_ms: 0,
            ..StoreConfig::default()
        };
        assert!(config.validate(false).is_ok());
    }
}
