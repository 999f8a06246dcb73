//! Observer side of the initialization handshake.

use super::{Handshake, InitSignal};
use crate::notify::Subscription;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Observed {
    Nothing,
    Failed(String),
    Ready,
}

struct WatcherState {
    observed: Mutex<Observed>,
    on_change: Box<dyn Fn(&InitSignal) + Send + Sync>,
}

impl WatcherState {
    /// Fold one signal in. Returns `true` if the observed outcome changed.
    fn observe(&self, signal: &InitSignal) -> bool {
        let next = match signal {
            InitSignal::Ready => Observed::Ready,
            InitSignal::Failed(message) => Observed::Failed(message.clone()),
        };
        let mut observed = self.observed.lock();
        if *observed == Observed::Ready || *observed == next {
            return false;
        }
        *observed = next;
        true
    }
}

/// Scoped observer of a store's initialization.
///
/// The callback runs once per distinct outcome: at most once for a failure
/// message and at most once for readiness, which is final. Repeated
/// broadcasts of the same outcome are folded together. Every received
/// broadcast is acknowledged, which ends the store's broadcast loop.
///
/// Dropping the watcher unregisters it.
pub struct InitWatcher {
    state: Arc<WatcherState>,
    _subscription: Subscription,
}

impl InitWatcher {
    pub(crate) fn new<F>(handshake: &Arc<Handshake>, on_change: F) -> Self
    where
        F: Fn(&InitSignal) + Send + Sync + 'static,
    {
        let state = Arc::new(WatcherState {
            observed: Mutex::new(Observed::Nothing),
            on_change: Box::new(on_change),
        });

        let receiver = Arc::clone(&state);
        let target = Arc::downgrade(handshake);
        let subscription = handshake.listen(move |signal| {
            if receiver.observe(signal) {
                (receiver.on_change)(signal);
            }
            if let Some(handshake) = target.upgrade() {
                handshake.acknowledge();
            }
        });

        // Catch up on an outcome that settled before this watcher existed.
        if let Some(signal) = handshake.settled_signal() {
            if state.observe(&signal) {
                (state.on_change)(&signal);
            }
            handshake.acknowledge();
        }

        Self {
            state,
            _subscription: subscription,
        }
    }

    /// `true` once this watcher has seen the store become ready.
    pub fn is_initialized(&self) -> bool {
        *self.state.observed.lock() == Observed::Ready
    }

    /// The failure message this watcher last saw, unless it has since seen readiness.
    pub fn failure(&self) -> Option<String> {
        match &*self.state.observed.lock() {
            Observed::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }
}
