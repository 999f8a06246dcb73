//! Store error types.

use crate::core::InitError;
use crate::persist::StorageError;
use thiserror::Error;

/// A single problem found while validating store configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigViolation {
    #[error("local storage key must not be empty")]
    EmptyStorageKey,

    #[error("throttle window must be greater than zero")]
    ZeroThrottleWindow,

    #[error("handshake retry interval must be greater than zero")]
    ZeroRetryInterval,

    #[error("use_local_storage is set but no storage backend was provided")]
    MissingStorage,
}

/// Errors that can occur when building a store.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Every configuration problem, not just the first
    #[error("Invalid store configuration: {}", format_violations(.0))]
    InvalidConfig(Vec<ConfigViolation>),

    #[error("A tokio runtime must be running to build a store with {0}")]
    MissingRuntime(&'static str),
}

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
