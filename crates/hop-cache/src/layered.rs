use async_trait::async_trait;
use hop_core::cache::{RedirectCache, Result};
use std::time::Duration;
use tracing::{debug, trace};

/// A two-level cache composing a fast local cache with a shared one.
///
/// L1 is typically [`MokaRedirectCache`] and L2 [`RedisRedirectCache`].
///
/// - **Get**: Try L1 first, then L2. An L2 hit is backfilled into L1.
/// - **Set**: Write to L2 first, then L1.
/// - **Delete**: Remove from L1, then L2.
///
/// L1 entries are only invalidated on the node that performs the mutation,
/// so the L1 TTL should be kept short when several nodes share L2.
///
/// [`MokaRedirectCache`]: crate::MokaRedirectCache
/// [`RedisRedirectCache`]: crate::RedisRedirectCache
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
}

impl<L1, L2> LayeredCache<L1, L2> {
    pub fn new(l1: L1, l2: L2) -> Self {
        Self { l1, l2 }
    }

    /// Returns a reference to the L1 cache.
    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    /// Returns a reference to the L2 cache.
    pub fn l2(&self) -> &L2 {
        &self.l2
    }
}

#[async_trait]
impl<L1, L2> RedirectCache for LayeredCache<L1, L2>
where
    L1: RedirectCache,
    L2: RedirectCache,
{
    async fn get_url(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_url_with_ttl(key).await?.map(|(url, _)| url))
    }

    async fn get_url_with_ttl(&self, key: &str) -> Result<Option<(String, Option<Duration>)>> {
        if let Some(hit) = self.l1.get_url_with_ttl(key).await? {
            debug!(key, "L1 cache hit");
            return Ok(Some(hit));
        }
        trace!(key, "L1 cache miss, trying L2");

        match self.l2.get_url_with_ttl(key).await? {
            Some((url, ttl)) => {
                // The L1 copy must not outlive the L2 entry it came from.
                debug!(key, remaining = ?ttl, "L2 cache hit, backfilling L1");
                self.l1.set_url(key, &url, ttl).await?;
                Ok(Some((url, ttl)))
            }
            None => {
                trace!(key, "L2 cache miss");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, key: &str, url: &str, ttl: Option<Duration>) -> Result<()> {
        self.l2.set_url(key, url, ttl).await?;
        self.l1.set_url(key, url, ttl).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.l1.del(key).await?;
        self.l2.del(key).await?;
        Ok(())
    }
}
