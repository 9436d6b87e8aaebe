use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Default lifetime of a redirect cache entry.
pub const DEFAULT_REDIRECT_TTL: Duration = Duration::from_secs(3600);

/// An advisory cache mapping a code or alias to its destination URL.
///
/// The cache is never authoritative. Implementations can use Redis, in-memory
/// caches, or other storage backends.
#[async_trait]
pub trait RedirectCache: Send + Sync + 'static {
    /// Get the cached destination for a code or alias.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, key: &str) -> Result<Option<String>>;

    /// Get the cached destination together with its remaining lifetime.
    ///
    /// The lifetime is `None` when the backend does not track one.
    async fn get_url_with_ttl(&self, key: &str) -> Result<Option<(String, Option<Duration>)>> {
        Ok(self.get_url(key).await?.map(|url| (url, None)))
    }

    /// Store a destination with optional TTL.
    ///
    /// If `ttl` is `None`, the implementation's default expiration applies.
    async fn set_url(&self, key: &str, url: &str, ttl: Option<Duration>) -> Result<()>;

    /// Remove a cached destination.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, key: &str) -> Result<()>;
}
