//! Store construction and the two store flavours.

mod builder;
mod config;
mod error;
mod historied;
mod static_store;

pub use builder::{StaticStoreBuilder, StoreBuilder};
pub use config::{StoreConfig, DEFAULT_RETRY_INTERVAL};
pub use error::{BuildError, ConfigViolation, StoreError};
pub use historied::Store;
pub use static_store::StaticStore;

use crate::handshake::{Handshake, InitSignal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One in-flight reinitialize.
///
/// Counts toward `is_reinitializing` while held. Dropping it without
/// settling, as happens when the caller drops the future, hands the
/// handshake back its previous outcome.
pub(crate) struct Reinitializing<'a> {
    counter: &'a AtomicUsize,
    handshake: &'a Arc<Handshake>,
    started: u64,
    settled: bool,
}

impl<'a> Reinitializing<'a> {
    pub(crate) fn begin(counter: &'a AtomicUsize, handshake: &'a Arc<Handshake>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        let started = handshake.reset();
        Self {
            counter,
            handshake,
            started,
            settled: false,
        }
    }

    pub(crate) fn settle(mut self, outcome: InitSignal) {
        self.settled = true;
        self.handshake.settle_attempt(self.started, outcome);
    }
}

impl Drop for Reinitializing<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        if !self.settled {
            self.handshake.abandon(self.started);
        }
    }
}
