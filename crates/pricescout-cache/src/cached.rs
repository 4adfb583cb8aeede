//! Read-through caching for an async computation.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::key::{make_cache_key, CacheType};
use crate::policy::CachePolicy;
use crate::two_tier::TwoTierCache;

/// Wraps `compute` so calls with equal arguments are served from the cache.
///
/// The key is built from the cache type, a component name, the component's
/// version hash and the serialized arguments. With no cache, or with the
/// cache disabled by policy, every call computes.
pub struct Cached<A, T, F> {
    cache: Option<Arc<TwoTierCache>>,
    cache_type: CacheType,
    component: &'static str,
    version_hash: &'static str,
    ttl_secs: i64,
    cacheable: fn(&T) -> bool,
    compute: F,
    _args: PhantomData<fn(A)>,
}

impl<A, T, F, Fut> Cached<A, T, F>
where
    A: Serialize,
    T: Serialize + DeserializeOwned,
    F: Fn(A) -> Fut,
    Fut: Future<Output = T>,
{
    #[must_use]
    pub fn new(
        cache: Option<Arc<TwoTierCache>>,
        policy: &CachePolicy,
        cache_type: CacheType,
        component: &'static str,
        version_hash: &'static str,
        compute: F,
    ) -> Self {
        Self {
            cache: cache.filter(|_| policy.enabled),
            cache_type,
            component,
            version_hash,
            ttl_secs: policy.ttl_secs(cache_type),
            cacheable: |_| true,
            compute,
            _args: PhantomData,
        }
    }

    /// Overrides the policy TTL for this wrapper.
    #[must_use]
    pub fn with_ttl(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Only results for which `cacheable` returns `true` are written.
    #[must_use]
    pub fn with_cacheable(mut self, cacheable: fn(&T) -> bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Returns the cached result for `args`, computing and storing it on a
    /// miss. With `bypass` set the cache is neither read nor written.
    pub async fn call(&self, args: A, bypass: bool) -> T {
        let Some(cache) = self.cache.as_ref().filter(|_| !bypass) else {
            return (self.compute)(args).await;
        };

        let key = match make_cache_key(self.cache_type, self.component, self.version_hash, &args) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(component = self.component, error = %e, "cannot build cache key, computing uncached");
                return (self.compute)(args).await;
            }
        };

        if let Some(hit) = cache.get::<T>(&key).await {
            return hit;
        }

        let value = (self.compute)(args).await;
        if (self.cacheable)(&value) {
            if let Err(e) = cache
                .set(&key, &value, self.ttl_secs, self.cache_type, self.version_hash)
                .await
            {
                tracing::warn!(component = self.component, error = %e, "result not cached");
            }
        } else {
            tracing::debug!(component = self.component, "result not cacheable, skipping write");
        }
        value
    }
}
