//! Initialization handshake between a store and late subscribers.
//!
//! Once the initializer settles, the store broadcasts an [`InitSignal`] every
//! retry interval until some observer acknowledges it. This turns a single
//! event into a level-triggered signal, so subscribers that show up late
//! still learn that initialization finished.
//!
//! A rejected initializer settles the handshake as [`InitStatus::Failed`] and
//! broadcasts that outcome under the same rule, so the loop always ends once
//! an observer has seen it.

mod watcher;

pub use watcher::InitWatcher;

use crate::notify::{Listeners, Subscription};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a store is in its initialization lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitStatus {
    /// Waiting for the initializer
    Pending,
    /// Initial data has arrived
    Ready,
    /// The initializer rejected with this message
    Failed(String),
}

/// Payload of one handshake broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitSignal {
    Ready,
    Failed(String),
}

#[derive(Debug)]
struct HandshakeState {
    status: InitStatus,
    acknowledged: bool,
    generation: u64,
    /// Most recent settled outcome, kept across resets
    last_outcome: Option<InitSignal>,
    /// Generation at which `Ready` last settled
    ready_generation: u64,
}

impl HandshakeState {
    fn commit(&mut self, outcome: InitSignal) -> u64 {
        self.status = match &outcome {
            InitSignal::Ready => InitStatus::Ready,
            InitSignal::Failed(message) => InitStatus::Failed(message.clone()),
        };
        self.acknowledged = false;
        self.generation += 1;
        if outcome == InitSignal::Ready {
            self.ready_generation = self.generation;
        }
        self.last_outcome = Some(outcome);
        self.generation
    }
}

/// Handshake state owned by one store instance.
pub(crate) struct Handshake {
    store_id: Uuid,
    retry_interval: Duration,
    runtime: Option<Handle>,
    log: bool,
    state: Mutex<HandshakeState>,
    listeners: Arc<Listeners<InitSignal>>,
}

impl Handshake {
    /// Create a handshake. Without an initializer the store is ready at once.
    pub(crate) fn new(
        store_id: Uuid,
        retry_interval: Duration,
        runtime: Option<Handle>,
        has_initializer: bool,
        log: bool,
    ) -> Arc<Self> {
        let (status, last_outcome) = if has_initializer {
            (InitStatus::Pending, None)
        } else {
            (InitStatus::Ready, Some(InitSignal::Ready))
        };
        Arc::new(Self {
            store_id,
            retry_interval,
            runtime,
            log,
            state: Mutex::new(HandshakeState {
                status,
                acknowledged: false,
                generation: 0,
                last_outcome,
                ready_generation: 0,
            }),
            listeners: Listeners::new(),
        })
    }

    pub(crate) fn status(&self) -> InitStatus {
        self.state.lock().status.clone()
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.state.lock().status == InitStatus::Ready
    }

    pub(crate) fn is_acknowledged(&self) -> bool {
        self.state.lock().acknowledged
    }

    /// Record an observer's acknowledgement. Repeated calls are harmless.
    pub(crate) fn acknowledge(&self) {
        let mut state = self.state.lock();
        if !state.acknowledged {
            state.acknowledged = true;
            if self.log {
                info!(store_id = %self.store_id, "store accepts acknowledgement");
            }
        }
    }

    /// Back to pending, ending any running broadcast loop.
    ///
    /// Returns the generation the reset opened, which identifies the attempt
    /// to [`Handshake::settle_attempt`] and [`Handshake::abandon`].
    pub(crate) fn reset(&self) -> u64 {
        let mut state = self.state.lock();
        state.status = InitStatus::Pending;
        state.acknowledged = false;
        state.generation += 1;
        state.generation
    }

    /// Settle the handshake and start broadcasting the outcome.
    pub(crate) fn settle(self: &Arc<Self>, outcome: InitSignal) {
        let generation = self.state.lock().commit(outcome);
        self.broadcast(generation);
    }

    /// Settle on behalf of the attempt opened at generation `started`.
    ///
    /// A failure is dropped when `Ready` has settled since the attempt
    /// started, so a stale rejection cannot mask fresher data. Returns
    /// whether the outcome was applied.
    pub(crate) fn settle_attempt(self: &Arc<Self>, started: u64, outcome: InitSignal) -> bool {
        let generation = {
            let mut state = self.state.lock();
            if matches!(outcome, InitSignal::Failed(_)) && state.ready_generation > started {
                debug!(store_id = %self.store_id, started, "stale rejection ignored");
                return false;
            }
            state.commit(outcome)
        };
        self.broadcast(generation);
        true
    }

    /// An attempt opened at generation `started` ended without an outcome.
    ///
    /// If nothing reset or settled the handshake since, the last settled
    /// outcome is restored and broadcast again.
    pub(crate) fn abandon(self: &Arc<Self>, started: u64) {
        let generation = {
            let mut state = self.state.lock();
            if state.generation != started {
                return;
            }
            match state.last_outcome.clone() {
                Some(outcome) => state.commit(outcome),
                None => return,
            }
        };
        debug!(store_id = %self.store_id, started, "abandoned attempt, previous outcome restored");
        self.broadcast(generation);
    }

    fn broadcast(self: &Arc<Self>, generation: u64) {
        let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
        match runtime {
            Some(runtime) => {
                runtime.spawn(broadcast_loop(Arc::downgrade(self), generation));
            }
            None => {
                warn!(store_id = %self.store_id, "no tokio runtime, handshake broadcast skipped");
            }
        }
    }

    /// Register a raw signal listener. It does not acknowledge.
    pub(crate) fn listen<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&InitSignal) + Send + Sync + 'static,
    {
        self.listeners.add(callback)
    }

    /// The signal a broadcast of the current round would carry, if any.
    fn current_signal(&self, generation: Option<u64>) -> Option<InitSignal> {
        let state = self.state.lock();
        if state.acknowledged || generation.is_some_and(|g| g != state.generation) {
            return None;
        }
        match &state.status {
            InitStatus::Pending => None,
            InitStatus::Ready => Some(InitSignal::Ready),
            InitStatus::Failed(message) => Some(InitSignal::Failed(message.clone())),
        }
    }

    /// The settled outcome, regardless of acknowledgement.
    fn settled_signal(&self) -> Option<InitSignal> {
        match &self.state.lock().status {
            InitStatus::Pending => None,
            InitStatus::Ready => Some(InitSignal::Ready),
            InitStatus::Failed(message) => Some(InitSignal::Failed(message.clone())),
        }
    }
}

async fn broadcast_loop(handshake: Weak<Handshake>, generation: u64) {
    loop {
        let Some(current) = handshake.upgrade() else {
            return;
        };
        let Some(signal) = current.current_signal(Some(generation)) else {
            return;
        };
        if current.log {
            info!(store_id = %current.store_id, signal = ?signal, "broadcasting initialization");
        }
        current.listeners.emit(&signal);
        let retry = current.retry_interval;
        drop(current);

        tokio::time::sleep(retry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn handshake(has_initializer: bool) -> Arc<Handshake> {
        Handshake::new(
            Uuid::new_v4(),
            Duration::from_secs(1),
            Handle::try_current().ok(),
            has_initializer,
            false,
        )
    }

    fn counting(handshake: &Handshake) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let subscription = handshake.listen(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscription)
    }

    #[test]
    fn without_initializer_starts_ready() {
        let handshake = handshake(false);
        assert_eq!(handshake.status(), InitStatus::Ready);
        assert!(handshake.is_initialized());
        assert!(!handshake.is_acknowledged());
    }

    #[tokio::test(start_paused = true)]
    async fn broadcasts_until_acknowledged() {
        let handshake = handshake(true);
        let (count, _subscription) = counting(&handshake);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        handshake.settle(InitSignal::Ready);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handshake.acknowledge();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_broadcast_too() {
        let handshake = handshake(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = handshake.listen(move |signal| sink.lock().push(signal.clone()));

        handshake.settle(InitSignal::Failed("offline".to_string()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        handshake.acknowledge();

        assert_eq!(
            handshake.status(),
            InitStatus::Failed("offline".to_string())
        );
        assert_eq!(
            *seen.lock(),
            vec![InitSignal::Failed("offline".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failure_does_not_override_newer_ready() {
        let handshake = handshake(true);
        let slow = handshake.reset();
        let fast = handshake.reset();

        assert!(handshake.settle_attempt(fast, InitSignal::Ready));
        assert!(!handshake.settle_attempt(slow, InitSignal::Failed("timeout".to_string())));
        assert_eq!(handshake.status(), InitStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_older_ready_still_applies() {
        let handshake = handshake(true);
        handshake.settle(InitSignal::Ready);

        let started = handshake.reset();
        assert!(handshake.settle_attempt(started, InitSignal::Failed("offline".to_string())));
        assert_eq!(handshake.status(), InitStatus::Failed("offline".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_attempt_restores_previous_outcome() {
        let handshake = handshake(true);
        let (count, _subscription) = counting(&handshake);
        handshake.settle(InitSignal::Ready);
        tokio::time::sleep(Duration::from_millis(10)).await;
        handshake.acknowledge();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let started = handshake.reset();
        handshake.abandon(started);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(handshake.status(), InitStatus::Ready);
        assert!(!handshake.is_acknowledged());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_is_ignored_once_superseded() {
        let handshake = handshake(true);
        handshake.settle(InitSignal::Ready);

        let first = handshake.reset();
        let _second = handshake.reset();
        handshake.abandon(first);
        assert_eq!(handshake.status(), InitStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_ends_running_loop() {
        let handshake = handshake(true);
        let (count, _subscription) = counting(&handshake);

        handshake.settle(InitSignal::Ready);
        tokio::time::sleep(Duration::from_millis(10)).await;
        handshake.reset();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(handshake.status(), InitStatus::Pending);
        assert!(!handshake.is_acknowledged());
    }
}
