//! End-to-end behavior of the historied store.

use parking_lot::Mutex;
use rewind::action_enum;
use rewind::core::{reducer_fn, Action, Reducer};
use rewind::effects::{Effect, EffectError, EffectRegistry, RegistryViolation};
use rewind::store::Store;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Todo {
    id: u32,
    text: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Board {
    items: Arc<Vec<Todo>>,
    filter: String,
}

action_enum! {
    #[derive(Debug, Clone)]
    enum BoardAction {
        Add { id: u32, text: String } => "TODO_ADD",
        Remove(u32) => "TODO_REMOVE",
        Filter(String) => "SET_FILTER",
    }
}

impl Action for BoardAction {
    type EffectData = u32;

    fn kind(&self) -> &str {
        self.kind_name()
    }

    fn effect_data(&self) -> Option<u32> {
        match self {
            Self::Add { id, .. } | Self::Remove(id) => Some(*id),
            Self::Filter(_) => None,
        }
    }
}

fn board() -> impl Reducer<Board, BoardAction> {
    reducer_fn(Board::default, |board: &Board, action: &BoardAction| match action {
        BoardAction::Add { id, text } => {
            let mut items = (*board.items).clone();
            items.push(Todo {
                id: *id,
                text: text.clone(),
            });
            Board {
                items: Arc::new(items),
                ..board.clone()
            }
        }
        BoardAction::Remove(id) => Board {
            items: Arc::new(board.items.iter().filter(|t| t.id != *id).cloned().collect()),
            ..board.clone()
        },
        BoardAction::Filter(filter) => Board {
            filter: filter.clone(),
            ..board.clone()
        },
    })
}

fn add(id: u32) -> BoardAction {
    BoardAction::Add {
        id,
        text: format!("task {id}"),
    }
}

/// Mirrors effect calls into a log the test can inspect.
#[derive(Default)]
struct RemoteLog {
    calls: Mutex<Vec<String>>,
}

impl RemoteLog {
    fn record(&self, entry: String) {
        self.calls.lock().push(entry);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock())
    }
}

fn syncing_registry(log: &Arc<RemoteLog>) -> EffectRegistry<Board, u32> {
    let (redo, undo, both) = (Arc::clone(log), Arc::clone(log), Arc::clone(log));
    EffectRegistry::builder()
        .known_kinds(BoardAction::KINDS)
        .register(
            "TODO_ADD",
            Effect::new()
                .on_redo(move |board: &Board, id, first_time| {
                    redo.record(format!(
                        "create {} first={first_time} len={}",
                        id.copied().unwrap_or_default(),
                        board.items.len()
                    ));
                    Ok(())
                })
                .on_undo(move |board: &Board, id| {
                    undo.record(format!(
                        "delete {} len={}",
                        id.copied().unwrap_or_default(),
                        board.items.len()
                    ));
                    Ok(())
                })
                .on_both(move |_, _| {
                    both.record("refresh".to_string());
                    Ok(())
                }),
        )
        .build()
        .unwrap()
}

#[test]
fn effects_replay_in_lock_step_with_navigation() {
    let log = Arc::new(RemoteLog::default());
    let store = Store::builder(board())
        .effects(syncing_registry(&log))
        .build()
        .unwrap();

    store.dispatch(add(1));
    assert_eq!(log.take(), vec!["create 1 first=true len=1", "refresh"]);

    store.undo();
    assert_eq!(log.take(), vec!["delete 1 len=0", "refresh"]);

    store.redo();
    assert_eq!(log.take(), vec!["create 1 first=false len=1", "refresh"]);

    store.dispatch(BoardAction::Filter("open".into()));
    store.undo();
    assert!(log.take().is_empty());
}

#[test]
fn redo_after_undo_restores_identical_snapshots() {
    let store = Store::builder(board()).build().unwrap();
    store.dispatch(add(1));
    store.dispatch(add(2));
    let latest = store.get_state();

    store.undo();
    store.undo();
    assert!(store.get_state().items.is_empty());

    store.redo();
    store.redo();
    assert!(Arc::ptr_eq(&store.get_state(), &latest));
}

#[test]
fn new_dispatch_truncates_redo_branch() {
    let store = Store::builder(board()).build().unwrap();
    for id in 1..=3 {
        store.dispatch(add(id));
    }
    store.undo();
    store.undo();
    store.dispatch(add(9));

    let history = store.history();
    let kinds: Vec<_> = history.records().iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, vec!["INIT", "TODO_ADD", "TODO_ADD"]);
    assert_eq!(history.records()[2].effect_data, Some(9));
    assert!(!store.can_redo());
}

#[test]
fn registry_rejects_kinds_outside_catalog() {
    let result = EffectRegistry::<Board, u32>::builder()
        .known_kinds(BoardAction::KINDS)
        .register("TODO_RENAME", Effect::new().on_both(|_, _| Ok(())))
        .build();

    let err = result.err().unwrap();
    assert_eq!(
        err.violations(),
        &[RegistryViolation::UnknownKind {
            kind: "TODO_RENAME".to_string()
        }]
    );
}

#[test]
fn selector_suppresses_unrelated_changes() {
    let store = Store::builder(board()).build().unwrap();
    let renders = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&renders);
    let _subscription = store.subscribe_selector(
        |board: &Board| Arc::clone(&board.items),
        move |_items| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    store.dispatch(BoardAction::Filter("done".into()));
    assert_eq!(renders.load(Ordering::SeqCst), 0);

    store.dispatch(add(1));
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    store.undo();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[test]
fn tuple_selector_compares_each_element() {
    let store = Store::builder(board()).build().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = store.subscribe_selector(
        |board: &Board| (board.items.len(), board.filter.clone()),
        move |(len, filter)| sink.lock().push(format!("{len}:{filter}")),
    );

    store.dispatch(BoardAction::Remove(42));
    store.dispatch(BoardAction::Filter("open".into()));
    store.dispatch(add(1));
    assert_eq!(*seen.lock(), vec!["0:open", "1:open"]);
}

#[test]
fn full_subscriber_sees_every_event_until_dropped() {
    let store = Store::builder(board()).build().unwrap();
    let lengths = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lengths);
    let subscription = store.subscribe_full(move |board| sink.lock().push(board.items.len()));

    store.dispatch(add(1));
    store.dispatch(BoardAction::Filter("x".into()));
    store.undo();
    drop(subscription);
    store.undo();

    assert_eq!(*lengths.lock(), vec![1, 1, 1]);
}

#[test]
fn observer_can_dispatch_from_notification() {
    let store = Store::builder(board()).build().unwrap();
    let follower = store.clone();
    let _subscription = store.subscribe(move |event| {
        let next = &event.next;
        if next.items.len() == 1 && next.filter.is_empty() {
            follower.dispatch(BoardAction::Filter("auto".into()));
        }
    });

    store.dispatch(add(1));
    assert_eq!(store.get_state().filter, "auto");
    assert_eq!(store.history_len(), 3);
}

#[test]
fn failing_effect_is_contained_and_history_moves_on() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let registry = EffectRegistry::builder()
        .register(
            "TODO_REMOVE",
            Effect::new().on_both(move |_: &Board, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(EffectError::new("backend unavailable"))
            }),
        )
        .build()
        .unwrap();
    let store = Store::builder(board()).effects(registry).build().unwrap();

    store.dispatch(add(1));
    store.dispatch(BoardAction::Remove(1));
    assert!(store.get_state().items.is_empty());

    assert!(store.undo());
    assert_eq!(store.get_state().items.len(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn reset_collapses_history_and_notifies_once() {
    let store = Store::builder(board()).build().unwrap();
    store.dispatch(add(1));
    store.dispatch(add(2));
    store.undo();

    let events = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&events);
    let _subscription = store.subscribe(move |event| {
        assert!(event.next.items.is_empty());
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.reset_state();
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(store.history_len(), 1);
    assert!(!store.can_undo());
    assert!(!store.can_redo());
}
