//! The link service.
//!
//! [`LinkService`] ties the code generator, the link store, and the redirect
//! cache together and owns the rules that keep the cache consistent with the
//! store across create, update, delete, and redirect.

pub mod api;
pub mod config;
pub mod error;
pub mod service;

pub use api::{CreateLink, LinkApi};
pub use config::{HitExpiry, ServiceConfig};
pub use error::{LinkError, Result};
pub use service::LinkService;
