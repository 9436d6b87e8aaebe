use crate::Generator;
use hop_core::ShortCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// A predictable generator producing sequential codes like "hp000000", "hp000001".
///
/// The URL plays no part in the candidate. Useful where codes must be known
/// ahead of time, e.g. to provoke collisions against pre-seeded records.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a generator whose first candidate uses `offset` as its counter.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }

    /// Returns the code the `n`-th candidate of this prefix carries.
    pub fn code_at(&self, n: u64) -> String {
        format!("{}{:06}", self.prefix, n)
    }
}

impl Generator for SeqGenerator {
    fn candidate(&self, _original_url: &str) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::generated(self.code_at(count))
    }
}
