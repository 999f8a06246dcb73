//! Core State trait for store snapshots.
//!
//! Every value held in a store's history must implement this trait. It is
//! blanket-implemented, so application root state types only need the
//! listed derives.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Trait for application root state held by a store.
///
/// Snapshots are immutable once recorded. They are shared behind `Arc` inside
/// the history, so no `Clone` bound is required.
///
/// # Required Traits
///
/// - `Debug`: Snapshots must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: Snapshots must be serializable for persistence
/// - `Send` + `Sync`: Snapshots are handed to effects and observers on any thread
///
/// # Example
///
/// ```rust
/// use rewind::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Counter {
///     value: i64,
/// }
///
/// fn assert_state<S: State>() {}
/// assert_state::<Counter>();
/// assert_state::<i32>();
/// ```
pub trait State: Debug + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> State for T where T: Debug + Serialize + DeserializeOwned + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TodoState {
        items: HashMap<String, String>,
        filter: Option<String>,
    }

    fn is_state<S: State>(_: &S) -> bool {
        true
    }

    #[test]
    fn plain_data_types_are_states() {
        assert!(is_state(&0i32));
        assert!(is_state(&String::from("hello")));
        assert!(is_state(&vec![1u8, 2, 3]));
    }

    #[test]
    fn derived_structs_are_states() {
        let state = TodoState {
            items: HashMap::new(),
            filter: None,
        };
        assert!(is_state(&state));
    }

    #[test]
    fn state_serializes_correctly() {
        let mut items = HashMap::new();
        items.insert("a".to_string(), "write docs".to_string());
        let state = TodoState {
            items,
            filter: Some("open".to_string()),
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TodoState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
