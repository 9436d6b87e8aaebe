use hop_core::DEFAULT_REDIRECT_TTL;
use hop_generator::GeneratorConfig;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use typed_builder::TypedBuilder;

/// How a cache hit treats a record that has expired in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HitExpiry {
    /// Serve the cached destination as long as the record exists.
    ///
    /// An expired link can keep resolving until its cache entry times out.
    #[default]
    Relaxed,
    /// Re-check expiry on every hit and evict expired entries.
    Strict,
}

impl Display for HitExpiry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HitExpiry::Relaxed => write!(f, "relaxed"),
            HitExpiry::Strict => write!(f, "strict"),
        }
    }
}

/// Settings for [`LinkService`](crate::LinkService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceConfig {
    /// TTL of redirect cache entries written on a miss.
    #[builder(default = DEFAULT_REDIRECT_TTL)]
    pub cache_ttl: Duration,
    #[builder(default)]
    pub hit_expiry: HitExpiry,
    #[builder(default)]
    pub generator: GeneratorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
