//! Rewind: a reducer-driven store with linear undo/redo
//!
//! Rewind keeps the reducer pure and pushes everything else to the edges.
//! Every dispatched action produces a new snapshot that is appended to a
//! linear history, and side effects tied to an action kind are replayed in
//! lock-step as the history is walked backward and forward.
//!
//! # Core Concepts
//!
//! - **Reducer**: Pure `(state, action) -> state` function supplied by the caller
//! - **History**: Ordered snapshots and action records with a movable position
//! - **Effects**: `on_redo` / `on_undo` / `on_both` callbacks keyed by action kind
//! - **Handshake**: Repeated initialization broadcast until an observer acknowledges it
//! - **Persistence**: Throttled writes of the current snapshot to a key-value store
//!
//! # Example
//!
//! ```rust
//! use rewind::core::{reducer_fn, Action, BasicAction};
//! use rewind::effects::{Effect, EffectRegistry};
//! use rewind::store::Store;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let undone = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&undone);
//!
//! let effects = EffectRegistry::builder()
//!     .register("ADD_TODO", Effect::new().on_undo(move |_, _| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let store = Store::builder(reducer_fn(Vec::<String>::new, |todos: &Vec<String>, a: &BasicAction| {
//!     let mut next = todos.clone();
//!     if a.kind() == "ADD_TODO" {
//!         next.push("write docs".to_string());
//!     }
//!     next
//! }))
//! .effects(effects)
//! .build()
//! .unwrap();
//!
//! store.dispatch(BasicAction::new("ADD_TODO"));
//! assert_eq!(store.get_state().len(), 1);
//!
//! store.undo();
//! assert!(store.get_state().is_empty());
//! assert_eq!(undone.load(Ordering::SeqCst), 1);
//! ```

pub mod core;
pub mod effects;
pub mod handshake;
pub mod notify;
pub mod persist;
pub mod store;

// Re-export commonly used types
pub use core::{Action, BasicAction, History, Reducer, State};
pub use notify::{ChangeEvent, Subscription};
pub use store::{StaticStore, Store, StoreBuilder, StoreConfig};
