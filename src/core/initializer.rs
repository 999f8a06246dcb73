//! The asynchronous initializer seam.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Failure reported by an initializer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Initializer failed: {message}")]
pub struct InitError {
    pub message: String,
}

impl InitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fetches or merges remote data into a state snapshot.
///
/// `force` is `true` for the first-time load at construction and reflects the
/// caller's request on manual re-initialization.
#[async_trait]
pub trait Initializer<S>: Send + Sync + 'static
where
    S: Send + Sync + 'static,
{
    async fn initialize(&self, init_state: Arc<S>, force: bool) -> Result<S, InitError>;
}

/// Initializer backed by an async closure. See [`initializer_fn`].
pub struct FnInitializer<S, F> {
    load: F,
    _phantom: PhantomData<fn() -> S>,
}

#[async_trait]
impl<S, F, Fut> Initializer<S> for FnInitializer<S, F>
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, bool) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, InitError>> + Send + 'static,
{
    async fn initialize(&self, init_state: Arc<S>, force: bool) -> Result<S, InitError> {
        (self.load)(init_state, force).await
    }
}

/// Build an initializer from an async closure.
///
/// # Example
///
/// ```rust
/// use rewind::core::{initializer_fn, InitError, Initializer};
/// use std::sync::Arc;
///
/// let loader = initializer_fn(|init: Arc<i32>, _force: bool| async move {
///     Ok::<_, InitError>(*init + 100)
/// });
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let loaded = rt.block_on(loader.initialize(Arc::new(1), true)).unwrap();
/// assert_eq!(loaded, 101);
/// ```
pub fn initializer_fn<S, F, Fut>(load: F) -> FnInitializer<S, F>
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, bool) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, InitError>> + Send + 'static,
{
    FnInitializer {
        load,
        _phantom: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLoader(Vec<String>);

    #[async_trait]
    impl Initializer<Vec<String>> for FixedLoader {
        async fn initialize(
            &self,
            init_state: Arc<Vec<String>>,
            force: bool,
        ) -> Result<Vec<String>, InitError> {
            if !force {
                return Ok(init_state.as_ref().clone());
            }
            let mut merged = init_state.as_ref().clone();
            merged.extend(self.0.iter().cloned());
            Ok(merged)
        }
    }

    #[tokio::test]
    async fn trait_initializer_merges_remote_data() {
        let loader = FixedLoader(vec!["remote".to_string()]);
        let loaded = loader
            .initialize(Arc::new(vec!["local".to_string()]), true)
            .await
            .unwrap();
        assert_eq!(loaded, vec!["local".to_string(), "remote".to_string()]);
    }

    #[tokio::test]
    async fn closure_initializer_receives_force_flag() {
        let loader = initializer_fn(|_init: Arc<bool>, force: bool| async move { Ok(force) });
        assert!(loader.initialize(Arc::new(false), true).await.unwrap());
        assert!(!loader.initialize(Arc::new(false), false).await.unwrap());
    }

    #[tokio::test]
    async fn closure_initializer_propagates_failure() {
        let loader = initializer_fn(|_init: Arc<i32>, _force: bool| async move {
            Err::<i32, _>(InitError::new("backend unavailable"))
        });
        let err = loader.initialize(Arc::new(0), true).await.unwrap_err();
        assert_eq!(err.message, "backend unavailable");
        assert_eq!(err.to_string(), "Initializer failed: backend unavailable");
    }
}
