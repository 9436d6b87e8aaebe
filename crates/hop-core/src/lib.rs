//! Core types and traits for the hop short-link service.
//!
//! This crate provides the link model, the short code type, and the store and
//! cache contracts shared by the generator, the link service, and the gateway.

pub mod cache;
pub mod error;
pub mod link;
pub mod shortcode;
pub mod store;

pub use cache::{RedirectCache, DEFAULT_REDIRECT_TTL};
pub use error::{CacheError, CoreError, StorageError};
pub use link::{LinkId, LinkRecord, LinkStats, NewLink, Owner};
pub use shortcode::{ShortCode, RESERVED_ALIASES};
pub use store::{LinkStore, ReadLinkStore};
