//! Short code generation.
//!
//! A [`Generator`] derives candidate codes without touching storage.
//! [`UniqueCodeGenerator`] turns candidates into a code that is free in the
//! link store, giving up after a bounded number of attempts.

pub mod error;
pub mod salted;
pub mod seq;
pub mod unique;

pub use error::{GeneratorError, Result};
pub use salted::SaltedDigestGenerator;
pub use seq::SeqGenerator;
pub use unique::{Attempts, GeneratorConfig, UniqueCodeGenerator};

use hop_core::ShortCode;

/// Trait for deriving candidate short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// Candidates are not guaranteed to be unique; repeated calls for the same
/// URL should yield different candidates so a collision can be retried.
pub trait Generator: Send + Sync + 'static {
    /// Derives a fresh candidate code for `original_url`.
    fn candidate(&self, original_url: &str) -> ShortCode;
}
