//! Effect error types.

use thiserror::Error;

/// Failure reported by an effect callback.
///
/// Effects run after the history has already moved, so a failure is logged
/// and never rolls the store back.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Effect failed: {0}")]
pub struct EffectError(pub String);

impl EffectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A single problem found while validating effect registrations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryViolation {
    #[error("Effect for '{kind}' has no callbacks")]
    EmptyEffect { kind: String },

    #[error("Effect for '{kind}' registered more than once")]
    DuplicateKind { kind: String },

    #[error("Kind '{kind}' is reserved for the initial history record")]
    ReservedKind { kind: String },

    #[error("Kind '{kind}' is not part of the action catalog")]
    UnknownKind { kind: String },
}

/// Errors that can occur when building an effect registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Every violation found, not just the first
    #[error("Invalid effect registry: {}", format_violations(.0))]
    Invalid(Vec<RegistryViolation>),
}

impl RegistryError {
    pub fn violations(&self) -> &[RegistryViolation] {
        match self {
            Self::Invalid(violations) => violations,
        }
    }
}

fn format_violations(violations: &[RegistryViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
