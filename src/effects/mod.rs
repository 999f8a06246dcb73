//! External side effects keyed by action kind.
//!
//! The store calls into this module after every history transition:
//!
//! - **Dispatch**: forward replay with `first_time = true`
//! - **Redo**: forward replay with `first_time = false`
//! - **Undo**: backward replay of the record being left
//!
//! Effects are fire-and-forget. The store neither awaits nor retries them,
//! and a failing effect never rolls back the history.

mod error;
mod registry;
mod replay;

pub use error::{EffectError, RegistryError, RegistryViolation};
pub use registry::{
    Effect, EffectRegistry, EffectRegistryBuilder, RedoFn, StaticEffectFn, StaticEffects,
    StaticEffectsBuilder, UndoFn,
};
pub use replay::Direction;

pub(crate) use replay::{replay, run_static};
