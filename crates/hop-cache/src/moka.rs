use async_trait::async_trait;
use hop_core::cache::{RedirectCache, Result};
use hop_core::DEFAULT_REDIRECT_TTL;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone)]
struct CachedUrl {
    url: String,
    ttl: Duration,
    written_at: Instant,
}

impl CachedUrl {
    fn remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.written_at.elapsed())
    }
}

/// Expires every entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, CachedUrl> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An in-process redirect cache backed by Moka.
///
/// Suitable for single-node deployments or as the L1 of a [`LayeredCache`]
/// in front of Redis. Each entry carries its own TTL.
///
/// [`LayeredCache`]: crate::LayeredCache
#[derive(Debug, Clone)]
pub struct MokaRedirectCache {
    cache: Cache<String, CachedUrl>,
    default_ttl: Duration,
}

impl MokaRedirectCache {
    /// Creates a cache holding up to 10,000 entries with the default TTL.
    pub fn new() -> Self {
        Self::builder().build().into()
    }

    /// Creates a cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build().into()
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }

    /// Number of live entries, after running pending maintenance.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for MokaRedirectCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedirectCache for MokaRedirectCache {
    async fn get_url(&self, key: &str) -> Result<Option<String>> {
        match self.cache.get(key).await {
            Some(entry) => {
                debug!(key, "cache hit in moka");
                Ok(Some(entry.url))
            }
            None => {
                trace!(key, "cache miss in moka");
                Ok(None)
            }
        }
    }

    async fn get_url_with_ttl(&self, key: &str) -> Result<Option<(String, Option<Duration>)>> {
        let Some(entry) = self.cache.get(key).await else {
            trace!(key, "cache miss in moka");
            return Ok(None);
        };
        let remaining = entry.remaining();
        if remaining.is_zero() {
            trace!(key, "moka entry expired before eviction");
            return Ok(None);
        }
        debug!(key, "cache hit in moka");
        Ok(Some((entry.url, Some(remaining))))
    }

    async fn set_url(&self, key: &str, url: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = CachedUrl {
            url: url.to_owned(),
            ttl: ttl.unwrap_or(self.default_ttl),
            written_at: Instant::now(),
        };
        self.cache.insert(key.to_owned(), entry).await;
        debug!(key, "cached destination in moka");
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        debug!(key, "removed destination from moka (if present)");
        Ok(())
    }
}

/// Configuration for creating a [`MokaRedirectCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct MokaCacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = 10_000)]
    max_capacity: u64,
    /// TTL applied when `set_url` is called without one.
    #[builder(default = DEFAULT_REDIRECT_TTL)]
    default_ttl: Duration,
}

impl From<MokaCacheConfig> for MokaRedirectCache {
    fn from(config: MokaCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        MokaRedirectCache {
            cache,
            default_ttl: config.default_ttl,
        }
    }
}
