//! The historied store: reducer-driven state with linear undo/redo.

use crate::core::{Action, ActionRecord, History, Initializer, Reducer, State};
use crate::effects::{replay, Direction, EffectRegistry};
use crate::handshake::{Handshake, InitSignal, InitStatus, InitWatcher};
use crate::notify::{on_selection_change, ChangeEvent, Listeners, ShallowEq, Subscription};
use crate::persist::{restore, PersistThrottle, StorageError};
use crate::store::builder::{Common, StoreBuilder};
use crate::store::config::StoreConfig;
use crate::store::error::StoreError;
use crate::store::Reinitializing;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, warn};
use uuid::Uuid;

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Fire-and-forget observer hooks for undo and redo.
#[derive(Default, Clone)]
pub(crate) struct Hooks {
    pub(crate) on_undo: Option<Hook>,
    pub(crate) on_redo: Option<Hook>,
}

struct StoreInner<S: State, A: Action> {
    id: Uuid,
    config: StoreConfig,
    reducer: Arc<dyn Reducer<S, A>>,
    initializer: Option<Arc<dyn Initializer<S>>>,
    effects: EffectRegistry<S, A::EffectData>,
    hooks: Hooks,
    init_state: Arc<S>,
    history: Mutex<History<S, A::EffectData>>,
    observers: Arc<Listeners<ChangeEvent<S>>>,
    handshake: Arc<Handshake>,
    throttle: Option<Arc<PersistThrottle>>,
    reinitializing: AtomicUsize,
}

/// A store with linear undo/redo history.
///
/// Handles are cheap to clone and share one history. Every operation runs
/// to completion synchronously, except [`Store::reinitialize`], which awaits
/// the initializer.
///
/// Change notifications are delivered on the calling thread after the
/// history is updated, with no lock held, so observers may read from or
/// dispatch to the store.
///
/// # Example
///
/// ```rust
/// use rewind::core::{reducer_fn, Action, BasicAction};
/// use rewind::store::Store;
///
/// let store = Store::builder(reducer_fn(|| 0i32, |s: &i32, a: &BasicAction| {
///     if a.kind() == "INC" { s + 1 } else { *s }
/// }))
/// .build()
/// .unwrap();
///
/// for _ in 0..3 {
///     store.dispatch(BasicAction::new("INC"));
/// }
/// assert_eq!(*store.get_state(), 3);
///
/// store.undo();
/// store.undo();
/// assert_eq!(*store.get_state(), 1);
///
/// store.dispatch(BasicAction::new("INC"));
/// assert_eq!(*store.get_state(), 2);
/// assert_eq!(store.history_len(), 3);
/// assert!(!store.redo());
/// ```
pub struct Store<S: State, A: Action> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S: State, A: Action> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: State, A: Action> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let history = self.inner.history.lock();
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("position", &history.position())
            .field("len", &history.len())
            .field("status", &self.inner.handshake.status())
            .finish()
    }
}

impl<S: State, A: Action> Store<S, A> {
    pub fn builder<R: Reducer<S, A>>(reducer: R) -> StoreBuilder<S, A> {
        StoreBuilder::new(reducer)
    }

    pub(crate) fn assemble(
        reducer: Arc<dyn Reducer<S, A>>,
        effects: EffectRegistry<S, A::EffectData>,
        hooks: Hooks,
        common: Common<S>,
        runtime: Option<Handle>,
    ) -> Self {
        let id = Uuid::new_v4();
        let init_state = Arc::new(reducer.initial_state());
        let storage = common.active_storage();
        let key = common.config.local_storage_key.clone();

        let restored = storage
            .as_deref()
            .and_then(|storage| restore::<S>(storage, &key))
            .map(Arc::new);
        let current = restored.unwrap_or_else(|| Arc::clone(&init_state));

        let handshake = Handshake::new(
            id,
            common.config.retry_interval(),
            runtime.clone(),
            common.initializer.is_some(),
            common.config.log,
        );
        let window = common.config.throttle_window();

        let inner = Arc::new_cyclic(|weak: &std::sync::Weak<StoreInner<S, A>>| {
            let throttle = match (storage, runtime.clone()) {
                (Some(storage), Some(runtime)) => {
                    let source = weak.clone();
                    Some(PersistThrottle::new(
                        id,
                        storage,
                        key,
                        window,
                        runtime,
                        Box::new(move || -> Result<String, StorageError> {
                            let inner = source.upgrade().ok_or(StorageError::StoreDropped)?;
                            let current = Arc::clone(inner.history.lock().current());
                            Ok(serde_json::to_string(&*current)?)
                        }),
                    ))
                }
                _ => None,
            };

            StoreInner {
                id,
                config: common.config,
                reducer,
                initializer: common.initializer,
                effects,
                hooks,
                init_state,
                history: Mutex::new(History::new(current)),
                observers: Listeners::new(),
                handshake,
                throttle,
                reinitializing: AtomicUsize::new(0),
            }
        });

        let store = Self { inner };
        if let (Some(initializer), Some(runtime)) = (store.inner.initializer.clone(), runtime) {
            let loader = store.clone();
            runtime.spawn(async move { loader.initial_load(initializer).await });
        }
        store
    }

    async fn initial_load(&self, initializer: Arc<dyn Initializer<S>>) {
        let inner = &self.inner;
        match initializer
            .initialize(Arc::clone(&inner.init_state), true)
            .await
        {
            Ok(loaded) => {
                let next = Arc::new(loaded);
                let (prev, is_current) = {
                    let mut history = inner.history.lock();
                    let prev = Arc::clone(history.current());
                    (prev, history.replace_latest(Arc::clone(&next)))
                };
                if inner.config.log {
                    info!(store_id = %inner.id, "initializer resolved");
                }
                if is_current {
                    inner.observers.emit(&ChangeEvent::new(prev, next));
                }
                inner.handshake.settle(InitSignal::Ready);
            }
            Err(err) => {
                warn!(store_id = %inner.id, error = %err, "initializer rejected");
                inner.handshake.settle(InitSignal::Failed(err.message));
            }
        }
    }

    /// Unique id of this store, used in its traces.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// The current snapshot.
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(self.inner.history.lock().current())
    }

    /// The snapshot the reducer produced at construction. Reset returns here.
    pub fn init_state(&self) -> Arc<S> {
        Arc::clone(&self.inner.init_state)
    }

    /// Apply `selector` to the current snapshot.
    pub fn select<T, F>(&self, selector: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let current = self.get_state();
        selector(&current)
    }

    /// Apply an action.
    ///
    /// Drops any redo entries, records the reducer's result, replays the
    /// action's forward effect with `first_time = true`, schedules
    /// persistence and notifies observers. A panicking reducer leaves the
    /// history untouched and propagates.
    pub fn dispatch(&self, action: A) {
        let inner = &self.inner;
        let record = ActionRecord::from_action(&action);

        let (prev, next, position) = {
            let mut history = inner.history.lock();
            let prev = Arc::clone(history.current());
            let next = Arc::new(inner.reducer.reduce(&prev, &action));
            history.push(Arc::clone(&next), record.clone());
            (prev, next, history.position())
        };
        if inner.config.log {
            info!(store_id = %inner.id, kind = %record.kind, position, "dispatch");
        }

        replay(
            &inner.effects,
            &*next,
            &record,
            Direction::Forward { first_time: true },
        );
        self.persist();
        inner.observers.emit(&ChangeEvent::new(prev, next));
    }

    /// Step back one entry. Returns `false` (and does nothing) at the start.
    ///
    /// The effect replayed is the one recorded for the entry being left.
    pub fn undo(&self) -> bool {
        let inner = &self.inner;
        let (prev, next, record, position) = {
            let mut history = inner.history.lock();
            let prev = Arc::clone(history.current());
            let Some(record) = history.step_back().cloned() else {
                return false;
            };
            (prev, Arc::clone(history.current()), record, history.position())
        };

        replay(&inner.effects, &*next, &record, Direction::Backward);
        inner.observers.emit(&ChangeEvent::new(prev, next));
        if let Some(hook) = &inner.hooks.on_undo {
            hook();
        }
        self.persist();
        if inner.config.log {
            info!(store_id = %inner.id, kind = %record.kind, position, "undo");
        }
        true
    }

    /// Step forward one entry. Returns `false` (and does nothing) at the end.
    pub fn redo(&self) -> bool {
        let inner = &self.inner;
        let (prev, next, record, position) = {
            let mut history = inner.history.lock();
            let prev = Arc::clone(history.current());
            let Some(record) = history.step_forward().cloned() else {
                return false;
            };
            (prev, Arc::clone(history.current()), record, history.position())
        };

        replay(
            &inner.effects,
            &*next,
            &record,
            Direction::Forward { first_time: false },
        );
        inner.observers.emit(&ChangeEvent::new(prev, next));
        if let Some(hook) = &inner.hooks.on_redo {
            hook();
        }
        self.persist();
        if inner.config.log {
            info!(store_id = %inner.id, kind = %record.kind, position, "redo");
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.lock().can_redo()
    }

    /// Collapse the history to the initial snapshot.
    ///
    /// Initialization status is left alone.
    pub fn reset_state(&self) {
        let inner = &self.inner;
        let next = Arc::clone(&inner.init_state);
        let prev = {
            let mut history = inner.history.lock();
            let prev = Arc::clone(history.current());
            history.replace_all(Arc::clone(&next));
            prev
        };
        if inner.config.log {
            info!(store_id = %inner.id, "reset");
        }
        inner.observers.emit(&ChangeEvent::new(prev, next));
        self.persist();
    }

    /// Run the initializer again and replace the whole history with its result.
    ///
    /// Does nothing without an initializer. Dispatches made while the
    /// initializer is pending are not blocked and are overwritten when it
    /// resolves; concurrent calls resolve last-writer-wins. Use
    /// [`Store::is_reinitializing`] to avoid the race.
    ///
    /// On rejection the history is left as it was and the handshake settles
    /// as failed, unless a later call has already settled it as ready.
    /// Dropping the future before it resolves restores the previous
    /// initialization outcome.
    pub async fn reinitialize(&self, force: bool) -> Result<(), StoreError> {
        let inner = &self.inner;
        let Some(initializer) = inner.initializer.clone() else {
            return Ok(());
        };

        let attempt = Reinitializing::begin(&inner.reinitializing, &inner.handshake);
        let outcome = initializer.initialize(self.get_state(), force).await;

        match outcome {
            Ok(loaded) => {
                let next = Arc::new(loaded);
                let prev = {
                    let mut history = inner.history.lock();
                    let prev = Arc::clone(history.current());
                    history.replace_all(Arc::clone(&next));
                    prev
                };
                if inner.config.log {
                    info!(store_id = %inner.id, force, "reinitialized");
                }
                inner.observers.emit(&ChangeEvent::new(prev, next));
                self.persist();
                attempt.settle(InitSignal::Ready);
                Ok(())
            }
            Err(err) => {
                warn!(store_id = %inner.id, error = %err, "reinitialize rejected");
                attempt.settle(InitSignal::Failed(err.message.clone()));
                Err(err.into())
            }
        }
    }

    /// `true` while at least one [`Store::reinitialize`] call is awaiting.
    pub fn is_reinitializing(&self) -> bool {
        self.inner.reinitializing.load(Ordering::SeqCst) > 0
    }

    /// Current index into the history.
    pub fn position(&self) -> usize {
        self.inner.history.lock().position()
    }

    /// Number of snapshots in the history, including the initial one.
    pub fn history_len(&self) -> usize {
        self.inner.history.lock().len()
    }

    /// A copy of the history. Snapshots are shared, not cloned.
    pub fn history(&self) -> History<S, A::EffectData> {
        self.inner.history.lock().clone()
    }

    /// Observe every change event.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent<S>) + Send + Sync + 'static,
    {
        self.inner.observers.add(listener)
    }

    /// Observe a derived value; `on_change` runs only when it changed.
    pub fn subscribe_selector<T, Sel, F>(&self, selector: Sel, on_change: F) -> Subscription
    where
        Sel: Fn(&S) -> T + Send + Sync + 'static,
        T: ShallowEq + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.inner
            .observers
            .add(on_selection_change(selector, on_change))
    }

    /// Observe the full state; `on_change` runs for every event.
    pub fn subscribe_full<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&Arc<S>) + Send + Sync + 'static,
    {
        self.inner.observers.add(move |event| on_change(&event.next))
    }

    /// Watch initialization; acknowledges the handshake on first contact.
    pub fn watch_initialized<F>(&self, on_change: F) -> InitWatcher
    where
        F: Fn(&InitSignal) + Send + Sync + 'static,
    {
        InitWatcher::new(&self.inner.handshake, on_change)
    }

    /// Observe raw handshake broadcasts without acknowledging them.
    pub fn on_init_signal<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&InitSignal) + Send + Sync + 'static,
    {
        self.inner.handshake.listen(listener)
    }

    /// Acknowledge the handshake, ending the broadcast loop.
    pub fn acknowledge(&self) {
        self.inner.handshake.acknowledge();
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.handshake.is_initialized()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.inner.handshake.is_acknowledged()
    }

    pub fn init_status(&self) -> InitStatus {
        self.inner.handshake.status()
    }

    /// Write the current snapshot now, ignoring the throttle window.
    ///
    /// A no-op when persistence is off.
    pub fn flush(&self) -> Result<(), StoreError> {
        match &self.inner.throttle {
            Some(throttle) => Ok(throttle.write_now()?),
            None => Ok(()),
        }
    }

    fn persist(&self) {
        if let Some(throttle) = &self.inner.throttle {
            throttle.schedule();
        }
    }
}
