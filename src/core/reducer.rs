//! The reducer seam.

use std::marker::PhantomData;

/// Pure transition function from `(state, action)` to the next state.
///
/// `initial_state` stands in for calling the reducer with no arguments: it
/// must return a valid root state.
///
/// Reducers run while the store's history is locked, so they must not call
/// back into the store.
pub trait Reducer<S, A>: Send + Sync + 'static {
    fn initial_state(&self) -> S;

    fn reduce(&self, state: &S, action: &A) -> S;
}

/// Reducer assembled from two closures. See [`reducer_fn`].
pub struct FnReducer<S, A, I, F> {
    init: I,
    reduce: F,
    _phantom: PhantomData<fn(&S, &A) -> S>,
}

impl<S, A, I, F> Reducer<S, A> for FnReducer<S, A, I, F>
where
    S: 'static,
    A: 'static,
    I: Fn() -> S + Send + Sync + 'static,
    F: Fn(&S, &A) -> S + Send + Sync + 'static,
{
    fn initial_state(&self) -> S {
        (self.init)()
    }

    fn reduce(&self, state: &S, action: &A) -> S {
        (self.reduce)(state, action)
    }
}

/// Build a reducer from an initial-state closure and a reduce closure.
///
/// # Example
///
/// ```rust
/// use rewind::core::{reducer_fn, Action, BasicAction, Reducer};
///
/// let counter = reducer_fn(
///     || 0i32,
///     |state: &i32, action: &BasicAction| match action.kind() {
///         "INC" => state + 1,
///         _ => *state,
///     },
/// );
///
/// assert_eq!(counter.initial_state(), 0);
/// assert_eq!(counter.reduce(&1, &BasicAction::new("INC")), 2);
/// assert_eq!(counter.reduce(&1, &BasicAction::new("NOPE")), 1);
/// ```
pub fn reducer_fn<S, A, I, F>(init: I, reduce: F) -> FnReducer<S, A, I, F>
where
    I: Fn() -> S + Send + Sync + 'static,
    F: Fn(&S, &A) -> S + Send + Sync + 'static,
{
    FnReducer {
        init,
        reduce,
        _phantom: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, BasicAction};

    #[derive(Debug, Clone, PartialEq)]
    struct Todos {
        items: Vec<String>,
    }

    struct TodoReducer;

    impl Reducer<Todos, BasicAction> for TodoReducer {
        fn initial_state(&self) -> Todos {
            Todos { items: Vec::new() }
        }

        fn reduce(&self, state: &Todos, action: &BasicAction) -> Todos {
            match (action.kind(), &action.effect_data) {
                ("ADD", Some(serde_json::Value::String(text))) => {
                    let mut items = state.items.clone();
                    items.push(text.clone());
                    Todos { items }
                }
                _ => state.clone(),
            }
        }
    }

    #[test]
    fn trait_reducer_produces_next_state() {
        let reducer = TodoReducer;
        let state = reducer.initial_state();
        let action = BasicAction::new("ADD").with_effect_data("milk".into());

        let next = reducer.reduce(&state, &action);
        assert_eq!(next.items, vec!["milk".to_string()]);
        assert!(state.items.is_empty());
    }

    #[test]
    fn fn_reducer_ignores_unknown_kinds() {
        let reducer = reducer_fn(|| 10i64, |s: &i64, a: &BasicAction| {
            if a.kind() == "DOUBLE" {
                s * 2
            } else {
                *s
            }
        });

        let init = reducer.initial_state();
        assert_eq!(reducer.reduce(&init, &BasicAction::new("DOUBLE")), 20);
        assert_eq!(reducer.reduce(&init, &BasicAction::new("OTHER")), 10);
    }
}
