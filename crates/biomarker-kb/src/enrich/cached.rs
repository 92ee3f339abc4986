//! Cache-first lookup with a rate limit on uncached calls.

use std::thread;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

use super::cache::MetadataCache;
use super::lookup::{CitationMetadata, ConditionMetadata, EntityMetadata, MetadataLookup};

/// Spaces out calls to at most `n` per second by sleeping the caller.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl RateLimiter {
    /// A limiter allowing `requests_per_second` calls; `None` never waits.
    pub fn new(requests_per_second: Option<f64>) -> Self {
        let interval = requests_per_second
            .filter(|rate| *rate > 0.0 && rate.is_finite())
            .map(|rate| Duration::from_secs_f64(1.0 / rate));
        Self {
            interval,
            last: None,
        }
    }

    /// Block until the next call is allowed.
    pub fn wait(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Counters for a [`CachedLookup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Answers served from the cache, misses included.
    pub cache_hits: usize,
    /// Calls that reached the inner lookup.
    pub calls: usize,
    /// Inner calls that returned an error.
    pub failures: usize,
}

/// Wraps a lookup with a cache so each identifier is fetched at most once.
///
/// Misses are cached as well. Failures are not, so a later run retries them.
pub struct CachedLookup<L, C> {
    inner: L,
    cache: C,
    limiter: RateLimiter,
    stats: LookupStats,
}

impl<L: MetadataLookup, C: MetadataCache> CachedLookup<L, C> {
    pub fn new(inner: L, cache: C) -> Self {
        Self {
            inner,
            cache,
            limiter: RateLimiter::new(None),
            stats: LookupStats::default(),
        }
    }

    /// Limit uncached calls to `requests_per_second`.
    pub fn with_rate_limit(mut self, requests_per_second: Option<f64>) -> Self {
        self.limiter = RateLimiter::new(requests_per_second);
        self
    }

    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    fn cached<T, F>(&mut self, key: String, fetch: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut L) -> Result<Option<T>>,
    {
        if let Some(value) = self.cache.get(&key) {
            if value.is_null() {
                self.stats.cache_hits += 1;
                return Ok(None);
            }
            match serde_json::from_value(value.clone()) {
                Ok(found) => {
                    self.stats.cache_hits += 1;
                    return Ok(Some(found));
                }
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "Unreadable cache entry, fetching again");
                }
            }
        }

        self.limiter.wait();
        self.stats.calls += 1;
        let result = match fetch(&mut self.inner) {
            Ok(result) => result,
            Err(e) => {
                self.stats.failures += 1;
                return Err(e);
            }
        };

        let value = match &result {
            Some(found) => serde_json::to_value(found)?,
            None => Value::Null,
        };
        self.cache.put(key, value);
        Ok(result)
    }
}

impl<L: MetadataLookup, C: MetadataCache> MetadataLookup for CachedLookup<L, C> {
    fn lookup(&mut self, namespace: &str, accession: &str) -> Result<Option<EntityMetadata>> {
        let key = format!("entity:{}:{}", namespace.to_lowercase(), accession);
        self.cached(key, |inner| inner.lookup(namespace, accession))
    }

    fn lookup_condition(&mut self, doid: &str) -> Result<Option<ConditionMetadata>> {
        let key = format!("condition:doid:{}", doid);
        self.cached(key, |inner| inner.lookup_condition(doid))
    }

    fn lookup_citation(&mut self, pubmed_id: &str) -> Result<Option<CitationMetadata>> {
        let key = format!("citation:pubmed:{}", pubmed_id);
        self.cached(key, |inner| inner.lookup_citation(pubmed_id))
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.finish()?;
        self.cache.persist()?;
        tracing::info!(
            cache_hits = self.stats.cache_hits,
            calls = self.stats.calls,
            failures = self.stats.failures,
            "Metadata lookups finished"
        );
        Ok(())
    }
}
