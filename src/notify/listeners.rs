//! Listener registry and scoped subscription handles.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Ordered set of callbacks for one event type, owned by a store instance.
pub(crate) struct Listeners<E> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback<E>)>>,
}

impl<E: 'static> Listeners<E> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Register a callback. It stays registered until the returned handle drops.
    pub(crate) fn add<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, Arc::new(callback)));

        let registry = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.remove(id);
            }
        })
    }

    fn remove(&self, id: u64) {
        self.entries.lock().retain(|(entry_id, _)| *entry_id != id);
    }

    /// Call every registered callback in registration order.
    ///
    /// The registry is not locked while callbacks run, so a callback may
    /// subscribe or unsubscribe without deadlocking.
    pub(crate) fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Handle for a registered listener.
///
/// Dropping the handle unregisters the listener. Call [`Subscription::detach`]
/// to keep it registered for as long as the store lives.
#[must_use = "dropping a Subscription unregisters its listener immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unregister now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered without holding the handle.
    pub fn detach(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
