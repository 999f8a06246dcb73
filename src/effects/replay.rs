//! Effect replay in lock-step with history navigation.
//!
//! Replay always runs after the history has moved. Callback failures, both
//! returned errors and panics, are contained here and logged.

use crate::core::ActionRecord;
use crate::effects::error::EffectError;
use crate::effects::registry::{EffectRegistry, StaticEffects};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// Direction of a history transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Dispatch or redo: the record was just entered
    Forward { first_time: bool },
    /// Undo: the record was just left
    Backward,
}

/// Replay the effect registered for `record.kind`.
///
/// Forward runs `on_redo` then `on_both`; backward runs `on_undo` then
/// `on_both`. Returns the number of callbacks that failed.
pub(crate) fn replay<S, D>(
    registry: &EffectRegistry<S, D>,
    state: &S,
    record: &ActionRecord<D>,
    direction: Direction,
) -> usize {
    let Some(effect) = registry.get(&record.kind) else {
        return 0;
    };
    let data = record.effect_data.as_ref();
    let mut failures = 0;

    match direction {
        Direction::Forward { first_time } => {
            if let Some(on_redo) = &effect.on_redo {
                if !contain(&record.kind, "on_redo", || on_redo(state, data, first_time)) {
                    failures += 1;
                }
            }
        }
        Direction::Backward => {
            if let Some(on_undo) = &effect.on_undo {
                if !contain(&record.kind, "on_undo", || on_undo(state, data)) {
                    failures += 1;
                }
            }
        }
    }

    if let Some(on_both) = &effect.on_both {
        if !contain(&record.kind, "on_both", || on_both(state, data)) {
            failures += 1;
        }
    }

    failures
}

/// Run the static effect registered for `kind`. Returns `false` if it failed.
pub(crate) fn run_static<S, A>(effects: &StaticEffects<S, A>, kind: &str, state: &S, action: &A) -> bool {
    match effects.get(kind) {
        Some(effect) => contain(kind, "static", || effect(state, action)),
        None => true,
    }
}

fn contain<F>(kind: &str, phase: &'static str, callback: F) -> bool
where
    F: FnOnce() -> Result<(), EffectError>,
{
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            warn!(kind, phase, error = %err, "effect callback failed");
            false
        }
        Err(payload) => {
            warn!(kind, phase, panic = %panic_message(payload.as_ref()), "effect callback panicked");
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
