//! Redirect cache implementations for the hop link service.
//!
//! The [`RedirectCache`] trait itself lives in `hop-core`; this crate
//! provides the backends it can be wired to.

pub mod layered;
pub mod moka;
pub mod noop;
pub mod redis;

pub use hop_core::cache::{RedirectCache, Result};
pub use hop_core::CacheError;
pub use layered::LayeredCache;
pub use moka::{MokaCacheConfig, MokaRedirectCache};
pub use noop::NoopCache;
pub use redis::{RedisRedirectCache, DEFAULT_KEY_PREFIX};
