//! Link store backends.

pub mod memory;
pub mod mysql;

pub use hop_core::store::{LinkStore, ReadLinkStore, Result};
pub use hop_core::StorageError;
pub use memory::InMemoryLinkStore;
pub use mysql::MySqlLinkStore;
