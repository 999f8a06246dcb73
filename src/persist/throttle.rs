//! Leading plus trailing edge write throttle.

use super::{Storage, StorageError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default minimum time between two writes.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(5);

/// Produces the serialized current snapshot at the time of the call.
pub(crate) type SnapshotSource = Box<dyn Fn() -> Result<String, StorageError> + Send + Sync>;

#[derive(Debug, Default)]
struct ThrottleFlags {
    writing: bool,
    queued: bool,
}

/// Writes the current snapshot at most once per window.
///
/// The first call in a burst writes immediately. Calls during the window
/// queue a single trailing write that reads the snapshot current when it
/// fires, so the final state always reaches storage.
pub(crate) struct PersistThrottle {
    store_id: Uuid,
    storage: Arc<dyn Storage>,
    key: String,
    window: Duration,
    runtime: Handle,
    source: SnapshotSource,
    flags: Mutex<ThrottleFlags>,
}

impl PersistThrottle {
    pub(crate) fn new(
        store_id: Uuid,
        storage: Arc<dyn Storage>,
        key: String,
        window: Duration,
        runtime: Handle,
        source: SnapshotSource,
    ) -> Arc<Self> {
        Arc::new(Self {
            store_id,
            storage,
            key,
            window,
            runtime,
            source,
            flags: Mutex::new(ThrottleFlags::default()),
        })
    }

    /// Request a write of the current snapshot.
    ///
    /// Writes at once if no window is open. Otherwise marks a trailing write
    /// for the end of the window.
    pub(crate) fn schedule(self: &Arc<Self>) {
        {
            let mut flags = self.flags.lock();
            if flags.writing {
                flags.queued = true;
                return;
            }
            flags.writing = true;
        }

        self.write_logged();
        let throttle = Arc::clone(self);
        self.runtime.spawn(async move { throttle.hold_window().await });
    }

    /// Keep the window open, flushing one queued write at each window end.
    async fn hold_window(&self) {
        loop {
            tokio::time::sleep(self.window).await;
            {
                let mut flags = self.flags.lock();
                if !flags.queued {
                    flags.writing = false;
                    return;
                }
                flags.queued = false;
            }
            self.write_logged();
        }
    }

    fn write_logged(&self) {
        if let Err(err) = self.write_now() {
            warn!(store_id = %self.store_id, key = %self.key, error = %err, "persisting state failed");
        }
    }

    /// Write the current snapshot immediately, bypassing the window.
    pub(crate) fn write_now(&self) -> Result<(), StorageError> {
        let blob = (self.source)()?;
        self.storage.set(&self.key, &blob)?;
        debug!(store_id = %self.store_id, key = %self.key, bytes = blob.len(), "persisted state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct RecordingStorage {
        writes: Mutex<Vec<String>>,
    }

    impl Storage for RecordingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.writes.lock().last().cloned())
        }

        fn set(&self, _key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.lock().push(value.to_string());
            Ok(())
        }
    }

    fn throttle_over(counter: &Arc<AtomicU64>, storage: &Arc<RecordingStorage>) -> Arc<PersistThrottle> {
        let source_counter = Arc::clone(counter);
        PersistThrottle::new(
            Uuid::new_v4(),
            Arc::clone(storage) as Arc<dyn Storage>,
            "test".to_string(),
            Duration::from_secs(5),
            Handle::current(),
            Box::new(move || Ok(source_counter.load(Ordering::SeqCst).to_string())),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_writes_immediately() {
        let counter = Arc::new(AtomicU64::new(1));
        let storage = Arc::new(RecordingStorage::default());
        let throttle = throttle_over(&counter, &storage);

        throttle.schedule();
        assert_eq!(*storage.writes.lock(), vec!["1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_coalesces_into_trailing_write_of_latest() {
        let counter = Arc::new(AtomicU64::new(0));
        let storage = Arc::new(RecordingStorage::default());
        let throttle = throttle_over(&counter, &storage);

        for n in 1..=20 {
            counter.store(n, Ordering::SeqCst);
            throttle.schedule();
        }
        assert_eq!(storage.writes.lock().len(), 1);

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(*storage.writes.lock(), vec!["1", "20"]);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_after_window_write_again() {
        let counter = Arc::new(AtomicU64::new(1));
        let storage = Arc::new(RecordingStorage::default());
        let throttle = throttle_over(&counter, &storage);

        throttle.schedule();
        tokio::time::sleep(Duration::from_secs(6)).await;
        counter.store(2, Ordering::SeqCst);
        throttle.schedule();

        assert_eq!(*storage.writes.lock(), vec!["1", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_during_trailing_window_queue_another_write() {
        let counter = Arc::new(AtomicU64::new(1));
        let storage = Arc::new(RecordingStorage::default());
        let throttle = throttle_over(&counter, &storage);

        throttle.schedule();
        throttle.schedule();
        tokio::time::sleep(Duration::from_millis(5500)).await;
        assert_eq!(*storage.writes.lock(), vec!["1", "1"]);

        counter.store(3, Ordering::SeqCst);
        throttle.schedule();
        assert_eq!(storage.writes.lock().len(), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*storage.writes.lock(), vec!["1", "1", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn source_failure_is_not_fatal() {
        let storage = Arc::new(RecordingStorage::default());
        let throttle = PersistThrottle::new(
            Uuid::new_v4(),
            Arc::clone(&storage) as Arc<dyn Storage>,
            "test".to_string(),
            Duration::from_secs(5),
            Handle::current(),
            Box::new(|| Err(StorageError::StoreDropped)),
        );

        throttle.schedule();
        assert!(throttle.write_now().is_err());
        assert!(storage.writes.lock().is_empty());
    }
}
