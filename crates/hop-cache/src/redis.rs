use async_trait::async_trait;
use hop_core::cache::{RedirectCache, Result};
use hop_core::{CacheError, DEFAULT_REDIRECT_TTL};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Key prefix used unless one is configured.
pub const DEFAULT_KEY_PREFIX: &str = "hop:redirect:";

/// A Redis-based implementation of [`RedirectCache`].
///
/// Destinations are stored as plain strings under `{prefix}{code}` and
/// expire through Redis' own `EX` option.
#[derive(Clone)]
pub struct RedisRedirectCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisRedirectCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRedirectCache")
            .field("key_prefix", &self.key_prefix)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

/// `PTTL` reports -2 for a missing key and -1 for a key without expiry.
fn remaining_ttl(pttl_millis: i64) -> Option<Duration> {
    u64::try_from(pttl_millis)
        .ok()
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
}

/// Redis `EX` takes whole seconds and rejects zero.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl RedisRedirectCache {
    /// Creates a new Redis redirect cache.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis redirect cache with a custom key prefix.
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            default_ttl: DEFAULT_REDIRECT_TTL,
        }
    }

    /// Opens a client for `redis_url` and establishes a multiplexed connection.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Initialization(format!("failed to connect to redis: {e}")))?;
        info!("connected to redis");
        Ok(Self::new(conn))
    }

    /// Sets the TTL applied when `set_url` is called without one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Generates the cache key for a code or alias.
    fn cache_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl RedirectCache for RedisRedirectCache {
    async fn get_url(&self, key: &str) -> Result<Option<String>> {
        let redis_key = self.cache_key(key);
        trace!(key, "fetching destination from redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(url)) => {
                debug!(key, "cache hit in redis");
                Ok(Some(url))
            }
            Ok(None) => {
                trace!(key, "cache miss in redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key, error = %e, "redis error on get");
                Err(map_redis_error("failed to fetch value from redis", e))
            }
        }
    }

    async fn get_url_with_ttl(&self, key: &str) -> Result<Option<(String, Option<Duration>)>> {
        let redis_key = self.cache_key(key);
        trace!(key, "fetching destination and ttl from redis");

        let mut conn = self.conn.clone();
        let reply: redis::RedisResult<(Option<String>, i64)> = redis::pipe()
            .get(&redis_key)
            .pttl(&redis_key)
            .query_async(&mut conn)
            .await;
        match reply {
            Ok((Some(url), pttl)) => {
                debug!(key, pttl_ms = pttl, "cache hit in redis");
                Ok(Some((url, remaining_ttl(pttl))))
            }
            Ok((None, _)) => {
                trace!(key, "cache miss in redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key, error = %e, "redis error on get");
                Err(map_redis_error("failed to fetch value from redis", e))
            }
        }
    }

    async fn set_url(&self, key: &str, url: &str, ttl: Option<Duration>) -> Result<()> {
        let redis_key = self.cache_key(key);
        let seconds = ttl_seconds(ttl.unwrap_or(self.default_ttl));

        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&redis_key, url, seconds).await {
            Ok(()) => {
                debug!(key, ttl_secs = seconds, "cached destination in redis");
                Ok(())
            }
            Err(e) => {
                warn!(key, error = %e, "failed to cache destination in redis");
                Err(map_redis_error("failed to write value to redis", e))
            }
        }
    }

    async fn del(&self, key: &str) -> Result<()> {
        let redis_key = self.cache_key(key);

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&redis_key).await {
            Ok(()) => {
                debug!(key, "removed destination from redis");
                Ok(())
            }
            Err(e) => {
                warn!(key, error = %e, "failed to remove destination from redis");
                Err(map_redis_error("failed to delete value from redis", e))
            }
        }
    }
}
