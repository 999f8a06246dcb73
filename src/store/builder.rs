//! Builders for historied and static stores.

use crate::core::{Action, Initializer, Reducer, State};
use crate::effects::{EffectRegistry, StaticEffects};
use crate::persist::Storage;
use crate::store::config::StoreConfig;
use crate::store::error::BuildError;
use crate::store::historied::{Hooks, Store};
use crate::store::static_store::StaticStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Settings shared by both store flavours.
pub(crate) struct Common<S> {
    pub(crate) config: StoreConfig,
    pub(crate) storage: Option<Arc<dyn Storage>>,
    pub(crate) initializer: Option<Arc<dyn Initializer<S>>>,
}

impl<S: State> Common<S> {
    fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            storage: None,
            initializer: None,
        }
    }

    /// Validate the settings and capture the runtime timers will run on.
    pub(crate) fn prepare(&self) -> Result<Option<Handle>, BuildError> {
        self.config.validate(self.storage.is_some())?;

        let needs = if self.initializer.is_some() {
            Some("an initializer")
        } else if self.config.use_local_storage {
            Some("persistence enabled")
        } else {
            None
        };

        match (needs, Handle::try_current()) {
            (_, Ok(handle)) => Ok(Some(handle)),
            (None, Err(_)) => Ok(None),
            (Some(what), Err(_)) => Err(BuildError::MissingRuntime(what)),
        }
    }

    /// The storage backend, if persistence is switched on.
    pub(crate) fn active_storage(&self) -> Option<Arc<dyn Storage>> {
        if self.config.use_local_storage {
            self.storage.clone()
        } else {
            None
        }
    }
}

/// Milliseconds in `duration`, rounded up.
fn ceil_millis(duration: Duration) -> u64 {
    let millis = duration.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

macro_rules! common_setters {
    () => {
        /// Replace the data-only configuration wholesale.
        pub fn config(mut self, config: StoreConfig) -> Self {
            self.common.config = config;
            self
        }

        /// Emit an info trace for every operation.
        pub fn log(mut self, enabled: bool) -> Self {
            self.common.config.log = enabled;
            self
        }

        /// Persist to `storage`. Switches persistence on.
        pub fn storage<T: Storage>(mut self, storage: T) -> Self {
            self.common.storage = Some(Arc::new(storage));
            self.common.config.use_local_storage = true;
            self
        }

        /// Persist to a shared storage handle. Switches persistence on.
        pub fn shared_storage(mut self, storage: Arc<dyn Storage>) -> Self {
            self.common.storage = Some(storage);
            self.common.config.use_local_storage = true;
            self
        }

        /// Toggle persistence without changing the backend.
        pub fn use_local_storage(mut self, enabled: bool) -> Self {
            self.common.config.use_local_storage = enabled;
            self
        }

        pub fn local_storage_key(mut self, key: impl Into<String>) -> Self {
            self.common.config.local_storage_key = key.into();
            self
        }

        /// Minimum time between persistence writes, in whole milliseconds.
        /// Fractions round up, so only a zero duration is rejected.
        pub fn throttle_window(mut self, window: Duration) -> Self {
            self.common.config.throttle_window_ms = ceil_millis(window);
            self
        }

        /// Time between handshake broadcasts, in whole milliseconds.
        /// Fractions round up, so only a zero duration is rejected.
        pub fn retry_interval(mut self, interval: Duration) -> Self {
            self.common.config.retry_interval_ms = ceil_millis(interval);
            self
        }

        /// Load initial data asynchronously once the store is built.
        pub fn initializer<I: Initializer<S>>(mut self, initializer: I) -> Self {
            self.common.initializer = Some(Arc::new(initializer));
            self
        }
    };
}

/// Builder for a historied [`Store`].
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
/// store.dispatch(BasicAction::new("INC"));
/// assert_eq!(*store.get_state(), 1);
/// ```
pub struct StoreBuilder<S: State, A: Action> {
    reducer: Arc<dyn Reducer<S, A>>,
    effects: EffectRegistry<S, A::EffectData>,
    hooks: Hooks,
    common: Common<S>,
}

impl<S: State, A: Action> StoreBuilder<S, A> {
    pub fn new<R: Reducer<S, A>>(reducer: R) -> Self {
        Self {
            reducer: Arc::new(reducer),
            effects: EffectRegistry::empty(),
            hooks: Hooks::default(),
            common: Common::new(),
        }
    }

    common_setters!();

    pub fn effects(mut self, effects: EffectRegistry<S, A::EffectData>) -> Self {
        self.effects = effects;
        self
    }

    /// Called after every successful undo.
    pub fn on_undo<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_undo = Some(Arc::new(hook));
        self
    }

    /// Called after every successful redo.
    pub fn on_redo<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_redo = Some(Arc::new(hook));
        self
    }

    /// Build the store.
    ///
    /// Fails if the configuration is invalid, or if an initializer or
    /// persistence is configured while no tokio runtime is running.
    pub fn build(self) -> Result<Store<S, A>, BuildError> {
        let runtime = self.common.prepare()?;
        Ok(Store::assemble(
            self.reducer,
            self.effects,
            self.hooks,
            self.common,
            runtime,
        ))
    }
}

/// Builder for a [`StaticStore`].
pub struct StaticStoreBuilder<S: State, A: Action> {
    reducer: Arc<dyn Reducer<S, A>>,
    effects: StaticEffects<S, A>,
    common: Common<S>,
}

impl<S: State, A: Action> StaticStoreBuilder<S, A> {
    pub fn new<R: Reducer<S, A>>(reducer: R) -> Self {
        Self {
            reducer: Arc::new(reducer),
            effects: StaticEffects::empty(),
            common: Common::new(),
        }
    }

    common_setters!();

    pub fn effects(mut self, effects: StaticEffects<S, A>) -> Self {
        self.effects = effects;
        self
    }

    pub fn build(self) -> Result<StaticStore<S, A>, BuildError> {
        let runtime = self.common.prepare()?;
        Ok(StaticStore::assemble(
            self.reducer,
            self.effects,
            self.common,
            runtime,
        ))
    }
}
