use async_trait::async_trait;
use hop_core::cache::{RedirectCache, Result};
use std::time::Duration;

/// A cache that stores nothing. Every lookup is a miss.
///
/// Lets the link service run store-only without special-casing a missing cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl RedirectCache for NoopCache {
    async fn get_url(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_url(&self, _key: &str, _url: &str, _ttl: Option<Duration>) -> Result<()> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
