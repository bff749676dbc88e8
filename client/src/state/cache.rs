//! List cache with coarse, key-level invalidation.
//!
//! Every list view reads through [`QueryCache::fetch`] under a resource key.
//! Mutations invalidate whole keys once their response has arrived; nothing is
//! merged optimistically. A read that was in flight while its key got
//! invalidated still returns its value to the caller but is not stored.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    Attendance,
    EarlyRequests,
    Documents,
    /// Administrator list views, namespaced as `admin:<resource>`.
    Admin(&'static str),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Attendance => f.write_str("attendance"),
            CacheKey::EarlyRequests => f.write_str("early-requests"),
            CacheKey::Documents => f.write_str("documents"),
            CacheKey::Admin(resource) => write!(f, "admin:{resource}"),
        }
    }
}

#[derive(Default)]
struct Entry {
    generation: u64,
    invalidations: u64,
    value: Option<Arc<dyn Any + Send + Sync>>,
}

#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<CacheKey, Entry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        // A panic while holding the lock leaves plain counters behind; keep going.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cached value for `key`, or runs `loader` and caches its
    /// result. Dropping the returned future abandons the read.
    pub async fn fetch<T, F, Fut>(&self, key: CacheKey, loader: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let generation = {
            let mut entries = self.entries();
            let entry = entries.entry(key).or_default();
            if let Some(value) = entry.value.as_ref().and_then(|v| v.downcast_ref::<T>()) {
                tracing::trace!(%key, "cache hit");
                return Ok(value.clone());
            }
            entry.generation
        };

        let value = loader().await?;

        let mut entries = self.entries();
        let entry = entries.entry(key).or_default();
        if entry.generation == generation {
            entry.value = Some(Arc::new(value.clone()));
        } else {
            tracing::debug!(%key, "read raced an invalidation; not caching");
        }
        Ok(value)
    }

    pub fn invalidate(&self, key: CacheKey) {
        let mut entries = self.entries();
        let entry = entries.entry(key).or_default();
        entry.generation += 1;
        entry.invalidations += 1;
        entry.value = None;
        tracing::debug!(%key, generation = entry.generation, "invalidated");
    }

    pub fn invalidate_all(&self, keys: &[CacheKey]) {
        for key in keys {
            self.invalidate(*key);
        }
    }

    pub fn is_fresh(&self, key: CacheKey) -> bool {
        self.entries()
            .get(&key)
            .map(|entry| entry.value.is_some())
            .unwrap_or(false)
    }

    pub fn invalidation_count(&self, key: CacheKey) -> u64 {
        self.entries()
            .get(&key)
            .map(|entry| entry.invalidations)
            .unwrap_or(0)
    }

    /// Drops every cached value, e.g. when the signed-in identity changes.
    pub fn clear(&self) {
        for (key, entry) in self.entries().iter_mut() {
            // In-flight reads must not store a value loaded before the clear.
            entry.generation += 1;
            if entry.value.take().is_some() {
                tracing::trace!(%key, "cleared");
            }
        }
    }

    /// Runs `mutation` on its own task so it completes (and its keys are
    /// invalidated) even if the caller stops waiting. Keys are invalidated
    /// only after a successful response.
    pub fn spawn_mutation<T, Fut>(
        &self,
        keys: Vec<CacheKey>,
        mutation: Fut,
    ) -> JoinHandle<Result<T, ApiError>>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            let result = mutation.await;
            if result.is_ok() {
                cache.invalidate_all(&keys);
            }
            result
        })
    }

    /// [`spawn_mutation`](Self::spawn_mutation) followed by waiting for it.
    pub async fn mutate<T, Fut>(&self, keys: Vec<CacheKey>, mutation: Fut) -> Result<T, ApiError>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.spawn_mutation(keys, mutation)
            .await
            .map_err(|e| ApiError::request_failed(format!("mutation task failed: {e}")))?
    }
}
