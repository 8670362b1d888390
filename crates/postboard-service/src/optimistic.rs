//! Optimistic cache updates
//!
//! A mutation runs as: snapshot the entry, write the expected result, await
//! the backend, restore the snapshot on failure, then invalidate on settle
//! so the next read reloads the authoritative record.

use crate::cache::{CachedValue, QueryCache, QueryKey};
use crate::error::ServiceResult;
use std::future::Future;

/// Optimistic update of one cache entry
#[derive(Debug, Clone)]
pub struct OptimisticUpdate {
    key: QueryKey,
    invalidate_lists: bool,
    refetch_on_settle: bool,
}

impl OptimisticUpdate {
    /// Update of `key`, invalidated once the mutation settles
    #[inline]
    #[must_use]
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            invalidate_lists: false,
            refetch_on_settle: true,
        }
    }

    /// Also invalidate every post list when settled
    #[inline]
    #[must_use]
    pub fn invalidate_post_lists(mut self) -> Self {
        self.invalidate_lists = true;
        self
    }

    /// Keep the optimistic value after success instead of invalidating
    #[inline]
    #[must_use]
    pub fn keep_on_settle(mut self) -> Self {
        self.refetch_on_settle = false;
        self
    }

    /// Entry being updated
    #[inline]
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Apply `apply` to the cached entry, then run `mutation`
    ///
    /// `apply` returns the optimistic value, or `None` to leave the entry
    /// alone. Nothing is applied when the entry is not cached.
    ///
    /// # Errors
    /// The mutation's error, after the snapshot is restored
    pub async fn run<T, F, Fut>(&self, cache: &QueryCache, apply: F, mutation: Fut) -> ServiceResult<T>
    where
        F: FnOnce(&CachedValue) -> Option<CachedValue>,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let snapshot = cache.get(&self.key).await;
        if let Some(next) = snapshot.as_ref().and_then(apply) {
            cache.insert(self.key.clone(), next).await;
        }

        let result = mutation.await;

        if let Err(err) = &result {
            tracing::warn!(key = %self.key, error = %err, "mutation failed, rolling back");
            match &snapshot {
                Some(previous) => cache.insert(self.key.clone(), previous.clone()).await,
                None => cache.invalidate(&self.key).await,
            }
        }

        if self.refetch_on_settle {
            cache.invalidate(&self.key).await;
        }
        if self.invalidate_lists {
            cache.invalidate_post_lists().await;
        }

        result
    }
}
