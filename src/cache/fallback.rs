//! Fallback-chained fetching on top of the cache
//!
//! Lookup order for a key:
//! 1. a fresh cached value,
//! 2. each provider in the order it was added; the first one producing a
//!    value wins and is cached,
//! 3. the caller's static default, which is not cached.
//!
//! `resolve_batch` applies the same order per id when one upstream call
//! serves several cache entries.
//!
//! Upstream errors are logged and swallowed here; callers never see them.

use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use super::CacheManager;
use crate::data::FetchError;

/// A pending upstream call. `Ok(None)` means the provider had nothing usable.
pub type ProviderFuture<'a, T> = BoxFuture<'a, Result<Option<T>, FetchError>>;

/// Where a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Served from a fresh cache entry
    Cache,
    /// Fetched just now from the named provider
    Live(&'static str),
    /// Every provider failed; static default value
    Fallback,
}

impl Source {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Source::Fallback)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Cache => write!(f, "cached"),
            Source::Live(name) => write!(f, "{}", name),
            Source::Fallback => write!(f, "static estimate"),
        }
    }
}

/// A value together with its provenance
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub value: T,
    pub source: Source,
    /// When the value was obtained from upstream (or produced as a default)
    pub fetched_at: DateTime<Utc>,
}

impl<T> Sourced<T> {
    /// Maps the value, keeping provenance
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: f(self.value),
            source: self.source,
            fetched_at: self.fetched_at,
        }
    }
}

/// Builder for a cache lookup with ordered upstream providers
pub struct FallbackChain<'a, T> {
    cache: &'a CacheManager,
    key: String,
    ttl: Duration,
    providers: Vec<(&'static str, ProviderFuture<'a, T>)>,
}

impl<'a, T> FallbackChain<'a, T>
where
    T: Serialize + DeserializeOwned + Send + 'a,
{
    pub fn new(cache: &'a CacheManager, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            key: key.into(),
            ttl,
            providers: Vec::new(),
        }
    }

    /// Appends a provider. Its future is only polled if every earlier
    /// source came up empty.
    pub fn provider<F>(mut self, name: &'static str, fetch: F) -> Self
    where
        F: Future<Output = Result<Option<T>, FetchError>> + Send + 'a,
    {
        self.providers.push((name, Box::pin(fetch)));
        self
    }

    /// Runs the chain, falling back to `default` if nothing else produced a value
    pub async fn resolve(self, default: T) -> Sourced<T> {
        self.resolve_with(move || default).await
    }

    /// Like `resolve`, but only builds the default when it is needed
    pub async fn resolve_with(self, default: impl FnOnce() -> T) -> Sourced<T> {
        if let Some(cached) = self.cache.get_fresh::<T>(&self.key) {
            tracing::debug!(key = %self.key, "cache hit");
            return Sourced {
                value: cached.data,
                source: Source::Cache,
                fetched_at: cached.cached_at,
            };
        }

        for (name, fetch) in self.providers {
            match fetch.await {
                Ok(Some(value)) => {
                    tracing::debug!(key = %self.key, provider = name, "fetched from provider");
                    self.cache.write(&self.key, &value, self.ttl);
                    return Sourced {
                        value,
                        source: Source::Live(name),
                        fetched_at: Utc::now(),
                    };
                }
                Ok(None) => {
                    tracing::warn!(key = %self.key, provider = name, "provider returned no data");
                }
                Err(e) => {
                    tracing::warn!(key = %self.key, provider = name, error = %e, "provider failed");
                }
            }
        }

        tracing::info!(key = %self.key, "all providers failed, using static default");
        Sourced {
            value: default(),
            source: Source::Fallback,
            fetched_at: Utc::now(),
        }
    }
}

/// Fallback lookup for several ids served by one batched provider call
///
/// Each id is cached under `{prefix}:{id}`. Ids with a fresh entry are not
/// requested. Ids the provider leaves out get `default(id)`, tagged
/// `Source::Fallback` and not cached.
pub async fn resolve_batch<T, F, Fut>(
    cache: &CacheManager,
    prefix: &str,
    ids: &[&'static str],
    ttl: Duration,
    provider: &'static str,
    fetch: F,
    default: impl Fn(&str) -> T,
) -> HashMap<&'static str, Sourced<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(Vec<&'static str>) -> Fut,
    Fut: Future<Output = Result<Option<HashMap<String, T>>, FetchError>>,
{
    let mut resolved = HashMap::new();
    let mut missing = Vec::new();
    for id in ids {
        match cache.get_fresh::<T>(&batch_key(prefix, id)) {
            Some(cached) => {
                resolved.insert(
                    *id,
                    Sourced {
                        value: cached.data,
                        source: Source::Cache,
                        fetched_at: cached.cached_at,
                    },
                );
            }
            None => missing.push(*id),
        }
    }
    if missing.is_empty() {
        tracing::debug!(prefix, "cache hit for every id");
        return resolved;
    }

    let mut live = match fetch(missing.clone()).await {
        Ok(Some(values)) => values,
        Ok(None) => {
            tracing::warn!(prefix, provider, "provider returned no data");
            HashMap::new()
        }
        Err(e) => {
            tracing::warn!(prefix, provider, error = %e, "provider failed");
            HashMap::new()
        }
    };

    let now = Utc::now();
    for id in missing {
        let sourced = match live.remove(id) {
            Some(value) => {
                cache.write(&batch_key(prefix, id), &value, ttl);
                Sourced {
                    value,
                    source: Source::Live(provider),
                    fetched_at: now,
                }
            }
            None => {
                tracing::info!(prefix, id, "no live value, using static default");
                Sourced {
                    value: default(id),
                    source: Source::Fallback,
                    fetched_at: now,
                }
            }
        };
        resolved.insert(id, sourced);
    }
    resolved
}

/// Cache key of one id in a batch, e.g. `market:bitcoin`
pub fn batch_key(prefix: &str, id: &str) -> String {
    format!("{}:{}", prefix, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn counted(
        calls: Arc<AtomicUsize>,
        result: Result<Option<u32>, FetchError>,
    ) -> Result<Option<u32>, FetchError> {
        calls.fetch_add(1, Ordering::SeqCst);
        result
    }

    #[tokio::test]
    async fn test_fresh_cache_short_circuits_providers() {
        let cache = CacheManager::new();
        cache.write("k", &7u32, Duration::minutes(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let result = FallbackChain::new(&cache, "k", Duration::minutes(5))
            .provider("first", counted(calls.clone(), Ok(Some(1))))
            .resolve(0)
            .await;

        assert_eq!(result.value, 7);
        assert_eq!(result.source, Source::Cache);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "providers must not be polled");
    }

    #[tokio::test]
    async fn test_first_successful_provider_wins_and_is_cached() {
        let cache = CacheManager::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let result = FallbackChain::new(&cache, "k", Duration::minutes(5))
            .provider("broken", counted(calls.clone(), Err(FetchError::Status(502))))
            .provider("empty", counted(calls.clone(), Ok(None)))
            .provider("good", counted(calls.clone(), Ok(Some(42))))
            .provider("never", counted(calls.clone(), Ok(Some(99))))
            .resolve(0)
            .await;

        assert_eq!(result.value, 42);
        assert_eq!(result.source, Source::Live("good"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.get_fresh::<u32>("k").map(|c| c.data), Some(42));
    }

    #[tokio::test]
    async fn test_all_providers_failing_returns_default_without_caching() {
        let cache = CacheManager::new();

        let result = FallbackChain::new(&cache, "k", Duration::minutes(5))
            .provider("down", async { Err::<Option<u32>, _>(FetchError::Status(500)) })
            .resolve(5)
            .await;

        assert_eq!(result.value, 5);
        assert!(result.source.is_fallback());
        assert!(cache.read::<u32>("k").is_none(), "defaults are not cached");
    }

    #[tokio::test]
    async fn test_stale_cache_is_not_served() {
        let cache = CacheManager::new();
        cache.write("k", &1u32, Duration::zero());

        let result = FallbackChain::new(&cache, "k", Duration::minutes(5))
            .provider("down", async { Ok::<Option<u32>, FetchError>(None) })
            .resolve(9)
            .await;

        assert_eq!(result.value, 9);
        assert_eq!(result.source, Source::Fallback);
    }

    #[tokio::test]
    async fn test_stale_cache_is_refreshed_from_provider() {
        let cache = CacheManager::new();
        cache.write("k", &1u32, Duration::zero());

        let result = FallbackChain::new(&cache, "k", Duration::minutes(5))
            .provider("api", async { Ok::<Option<u32>, FetchError>(Some(2)) })
            .resolve(9)
            .await;

        assert_eq!(result.value, 2);
        assert_eq!(cache.get_fresh::<u32>("k").map(|c| c.data), Some(2));
    }

    #[tokio::test]
    async fn test_no_providers_uses_default() {
        let cache = CacheManager::new();

        let result = FallbackChain::<u32>::new(&cache, "k", Duration::minutes(5))
            .resolve_with(|| 3)
            .await;

        assert_eq!(result.value, 3);
        assert_eq!(result.source, Source::Fallback);
    }

    fn batch_response(
        pairs: &[(&str, u32)],
    ) -> Result<Option<HashMap<String, u32>>, FetchError> {
        Ok(Some(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()))
    }

    #[tokio::test]
    async fn test_batch_marks_missing_ids_as_fallback_and_skips_caching_them() {
        let cache = CacheManager::new();

        let result = resolve_batch(
            &cache,
            "price",
            &["a", "b"],
            Duration::minutes(5),
            "api",
            |_| async { batch_response(&[("a", 1)]) },
            |_| 0u32,
        )
        .await;

        assert_eq!(result["a"].value, 1);
        assert_eq!(result["a"].source, Source::Live("api"));
        assert_eq!(result["b"].value, 0);
        assert_eq!(result["b"].source, Source::Fallback);
        assert_eq!(cache.get_fresh::<u32>("price:a").map(|c| c.data), Some(1));
        assert!(cache.read::<u32>("price:b").is_none(), "defaults are not cached");
    }

    #[tokio::test]
    async fn test_batch_requests_only_ids_missing_from_cache() {
        let cache = CacheManager::new();
        cache.write("price:a", &7u32, Duration::minutes(5));

        let result = resolve_batch(
            &cache,
            "price",
            &["a", "b"],
            Duration::minutes(5),
            "api",
            |missing| async move {
                assert_eq!(missing, vec!["b"]);
                batch_response(&[("b", 2)])
            },
            |_| 0u32,
        )
        .await;

        assert_eq!(result["a"].source, Source::Cache);
        assert_eq!(result["a"].value, 7);
        assert_eq!(result["b"].source, Source::Live("api"));
    }

    #[tokio::test]
    async fn test_batch_provider_failure_uses_defaults() {
        let cache = CacheManager::new();

        let result = resolve_batch(
            &cache,
            "price",
            &["a"],
            Duration::minutes(5),
            "api",
            |_| async { Err::<Option<HashMap<String, u32>>, _>(FetchError::Status(503)) },
            |id| if id == "a" { 4u32 } else { 0 },
        )
        .await;

        assert_eq!(result["a"].value, 4);
        assert!(result["a"].source.is_fallback());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_source_display() {
        assert_eq!(Source::Cache.to_string(), "cached");
        assert_eq!(Source::Live("Etherscan").to_string(), "Etherscan");
        assert_eq!(Source::Fallback.to_string(), "static estimate");
    }

    #[test]
    fn test_sourced_map_keeps_provenance() {
        let sourced = Sourced {
            value: 2u32,
            source: Source::Live("x"),
            fetched_at: Utc::now(),
        };
        let mapped = sourced.map(|v| v * 10);
        assert_eq!(mapped.value, 20);
        assert_eq!(mapped.source, Source::Live("x"));
    }
}
