//! The non-historied store variant.

use crate::core::{Action, Initializer, Reducer, State};
use crate::effects::{run_static, StaticEffects};
use crate::handshake::{Handshake, InitSignal, InitStatus, InitWatcher};
use crate::notify::{on_selection_change, ChangeEvent, Listeners, ShallowEq, Subscription};
use crate::persist::{restore, PersistThrottle, StorageError};
use crate::store::builder::{Common, StaticStoreBuilder};
use crate::store::config::StoreConfig;
use crate::store::error::StoreError;
use crate::store::Reinitializing;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{info, warn};
use uuid::Uuid;

struct StaticInner<S: State, A: Action> {
    id: Uuid,
    config: StoreConfig,
    reducer: Arc<dyn Reducer<S, A>>,
    initializer: Option<Arc<dyn Initializer<S>>>,
    effects: StaticEffects<S, A>,
    init_state: Arc<S>,
    current: Mutex<Arc<S>>,
    observers: Arc<Listeners<ChangeEvent<S>>>,
    handshake: Arc<Handshake>,
    throttle: Option<Arc<PersistThrottle>>,
    reinitializing: AtomicUsize,
}

/// A store holding only the current snapshot and the initial one.
///
/// Shares the historied store's contracts for persistence, notification and
/// the initialization handshake, without undo or redo.
///
/// ```rust
/// use rewind::core::{reducer_fn, Action, BasicAction};
/// use rewind::store::StaticStore;
///
/// let store = StaticStore::builder(reducer_fn(Vec::<String>::new, |s: &Vec<String>, a: &BasicAction| {
///     let mut next = s.clone();
///     next.push(a.kind().to_string());
///     next
/// }))
/// .build()
/// .unwrap();
///
/// store.dispatch(BasicAction::new("OPENED"));
/// assert_eq!(store.select(|s| s.len()), 1);
/// store.reset_state();
/// assert!(store.get_state().is_empty());
/// ```
pub struct StaticStore<S: State, A: Action> {
    inner: Arc<StaticInner<S, A>>,
}

impl<S: State, A: Action> Clone for StaticStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: State, A: Action> fmt::Debug for StaticStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticStore")
            .field("id", &self.inner.id)
            .field("state", &*self.get_state())
            .field("status", &self.inner.handshake.status())
            .finish()
    }
}

impl<S: State, A: Action> StaticStore<S, A> {
    pub fn builder<R: Reducer<S, A>>(reducer: R) -> StaticStoreBuilder<S, A> {
        StaticStoreBuilder::new(reducer)
    }

    pub(crate) fn assemble(
        reducer: Arc<dyn Reducer<S, A>>,
        effects: StaticEffects<S, A>,
        common: Common<S>,
        runtime: Option<Handle>,
    ) -> Self {
        let id = Uuid::new_v4();
        let init_state = Arc::new(reducer.initial_state());
        let storage = common.active_storage();
        let key = common.config.local_storage_key.clone();

        let current = storage
            .as_deref()
            .and_then(|storage| restore::<S>(storage, &key))
            .map(Arc::new)
            .unwrap_or_else(|| Arc::clone(&init_state));

        let handshake = Handshake::new(
            id,
            common.config.retry_interval(),
            runtime.clone(),
            common.initializer.is_some(),
            common.config.log,
        );
        let window = common.config.throttle_window();

        let inner = Arc::new_cyclic(|weak: &Weak<StaticInner<S, A>>| {
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
                            let current = Arc::clone(&*inner.current.lock());
                            Ok(serde_json::to_string(&*current)?)
                        }),
                    ))
                }
                _ => None,
            };

            StaticInner {
                id,
                config: common.config,
                reducer,
                initializer: common.initializer,
                effects,
                init_state,
                current: Mutex::new(current),
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
                self.replace(Arc::new(loaded));
                inner.handshake.settle(InitSignal::Ready);
            }
            Err(err) => {
                warn!(store_id = %inner.id, error = %err, "initializer rejected");
                inner.handshake.settle(InitSignal::Failed(err.message));
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&*self.inner.current.lock())
    }

    pub fn init_state(&self) -> Arc<S> {
        Arc::clone(&self.inner.init_state)
    }

    pub fn select<T, F>(&self, selector: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let current = self.get_state();
        selector(&current)
    }

    /// Reduce, run the static effect for the action's kind, persist, notify.
    pub fn dispatch(&self, action: A) {
        let inner = &self.inner;
        let (prev, next) = {
            let mut current = inner.current.lock();
            let next = Arc::new(inner.reducer.reduce(&current, &action));
            let prev = std::mem::replace(&mut *current, Arc::clone(&next));
            (prev, next)
        };
        if inner.config.log {
            info!(store_id = %inner.id, kind = %action.kind(), "dispatch");
        }

        run_static(&inner.effects, action.kind(), &*next, &action);
        self.persist();
        inner.observers.emit(&ChangeEvent::new(prev, next));
    }

    /// Replace the current snapshot with the initial one.
    pub fn reset_state(&self) {
        let inner = &self.inner;
        if inner.config.log {
            info!(store_id = %inner.id, "reset");
        }
        self.replace(Arc::clone(&inner.init_state));
        self.persist();
    }

    /// Run the initializer on the initial snapshot and adopt its result.
    pub async fn reinitialize(&self, force: bool) -> Result<(), StoreError> {
        let inner = &self.inner;
        let Some(initializer) = inner.initializer.clone() else {
            return Ok(());
        };

        let attempt = Reinitializing::begin(&inner.reinitializing, &inner.handshake);
        let outcome = initializer
            .initialize(Arc::clone(&inner.init_state), force)
            .await;

        match outcome {
            Ok(loaded) => {
                if inner.config.log {
                    info!(store_id = %inner.id, force, "reinitialized");
                }
                self.replace(Arc::new(loaded));
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

    pub fn is_reinitializing(&self) -> bool {
        self.inner.reinitializing.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent<S>) + Send + Sync + 'static,
    {
        self.inner.observers.add(listener)
    }

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

    pub fn subscribe_full<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&Arc<S>) + Send + Sync + 'static,
    {
        self.inner.observers.add(move |event| on_change(&event.next))
    }

    pub fn watch_initialized<F>(&self, on_change: F) -> InitWatcher
    where
        F: Fn(&InitSignal) + Send + Sync + 'static,
    {
        InitWatcher::new(&self.inner.handshake, on_change)
    }

    pub fn on_init_signal<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&InitSignal) + Send + Sync + 'static,
    {
        self.inner.handshake.listen(listener)
    }

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

    pub fn flush(&self) -> Result<(), StoreError> {
        match &self.inner.throttle {
            Some(throttle) => Ok(throttle.write_now()?),
            None => Ok(()),
        }
    }

    fn replace(&self, next: Arc<S>) {
        let prev = std::mem::replace(&mut *self.inner.current.lock(), Arc::clone(&next));
        self.inner.observers.emit(&ChangeEvent::new(prev, next));
    }

    fn persist(&self) {
        if let Some(throttle) = &self.inner.throttle {
            throttle.schedule();
        }
    }
}
