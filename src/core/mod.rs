//! Core store types.
//!
//! This module contains the data side of the store:
//! - Snapshot requirements via the `State` trait
//! - Actions and the records the history keeps of them
//! - The linear snapshot history
//! - The reducer and initializer seams
//!
//! Nothing here schedules timers or notifies observers; that belongs to the
//! store built on top.

mod action;
mod history;
mod initializer;
mod macros;
mod reducer;
mod state;

pub use action::{Action, ActionRecord, BasicAction, INIT_KIND};
pub use history::History;
pub use initializer::{initializer_fn, FnInitializer, InitError, Initializer};
pub use reducer::{reducer_fn, FnReducer, Reducer};
pub use state::State;
