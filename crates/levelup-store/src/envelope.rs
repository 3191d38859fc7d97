//! The `{items, loading, error}` wrapper shared by both caches.

use std::future::Future;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use levelup_transport::TransportError;

use crate::StoreError;

/// A collection plus the status of the requests that maintain it.
///
/// `loading` goes up when a request is issued and down when a request
/// settles. Concurrent requests are not coordinated: whichever settles
/// last decides the final `loading` and `error` values, and every
/// successful response is applied when it arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for CacheEnvelope<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

/// A [`CacheEnvelope`] behind a lock, with the pending/fulfilled/rejected
/// bookkeeping every cache operation goes through.
///
/// The lock is only taken for field updates and never held across an
/// `.await`.
#[derive(Debug)]
pub(crate) struct SharedEnvelope<T> {
    inner: RwLock<CacheEnvelope<T>>,
}

impl<T: Clone> SharedEnvelope<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(CacheEnvelope::default()),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, CacheEnvelope<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheEnvelope<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> CacheEnvelope<T> {
        self.read().clone()
    }

    /// Records a validation failure. No request was issued, so `loading`
    /// is left alone.
    pub(crate) fn reject_locally(&self, message: impl Into<String>) -> StoreError {
        let err = StoreError::Validation(message.into());
        self.write().error = Some(err.to_string());
        err
    }

    /// Runs one request through the pending → fulfilled/rejected cycle.
    ///
    /// `apply` reconciles the collection with the server's response; it
    /// only runs on success.
    pub(crate) async fn track<R, Fut, F>(
        &self,
        operation: &'static str,
        request: Fut,
        apply: F,
    ) -> Result<R, StoreError>
    where
        Fut: Future<Output = Result<R, TransportError>>,
        F: FnOnce(&mut Vec<T>, &R),
    {
        {
            let mut envelope = self.write();
            envelope.loading = true;
            envelope.error = None;
        }

        match request.await {
            Ok(response) => {
                let mut envelope = self.write();
                apply(&mut envelope.items, &response);
                envelope.loading = false;
                tracing::debug!(operation, items = envelope.items.len(), "cache updated");
                Ok(response)
            }
            Err(e) => {
                let err = StoreError::from(e);
                let mut envelope = self.write();
                envelope.loading = false;
                envelope.error = Some(err.to_string());
                tracing::warn!(operation, error = %err, "cache operation failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_track_success_applies_and_clears_loading() {
        let cache = SharedEnvelope::<u32>::new();

        let result = cache
            .track("load", async { Ok(vec![1, 2, 3]) }, |items, fresh: &Vec<u32>| {
                *items = fresh.clone();
            })
            .await;

        assert!(result.is_ok());
        let snap = cache.snapshot();
        assert_eq!(snap.items, vec![1, 2, 3]);
        assert!(!snap.loading);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_track_failure_keeps_items_and_records_error() {
        let cache = SharedEnvelope::<u32>::new();
        cache
            .track("load", async { Ok(vec![7]) }, |items, fresh: &Vec<u32>| {
                *items = fresh.clone();
            })
            .await
            .unwrap();

        let result = cache
            .track(
                "load",
                async { Err::<Vec<u32>, _>(TransportError::Network("down".into())) },
                |items, fresh: &Vec<u32>| *items = fresh.clone(),
            )
            .await;

        assert!(result.is_err());
        let snap = cache.snapshot();
        assert_eq!(snap.items, vec![7]);
        assert!(!snap.loading);
        assert!(snap.error.unwrap().contains("down"));
    }

    #[tokio::test]
    async fn test_track_clears_previous_error() {
        let cache = SharedEnvelope::<u32>::new();
        cache.reject_locally("name is required");

        cache
            .track("load", async { Ok(Vec::<u32>::new()) }, |_, _| {})
            .await
            .unwrap();

        assert!(cache.snapshot().error.is_none());
    }

    #[test]
    fn test_reject_locally_does_not_set_loading() {
        let cache = SharedEnvelope::<u32>::new();

        let err = cache.reject_locally("cost must be positive");

        let snap = cache.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.error.as_deref(), Some("cost must be positive"));
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
