use crate::salted::{SaltedDigestGenerator, DEFAULT_CODE_LENGTH};
use crate::{Generator, GeneratorError, Result};
use hop_core::{ReadLinkStore, ShortCode};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Default bound on candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Settings for [`UniqueCodeGenerator`] built on the salted digest generator.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GeneratorConfig {
    /// Length of generated codes.
    #[builder(default = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,
    /// Candidates tried per code assignment before failing with `ExhaustedRetries`.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Finds a code that is free in the link store.
///
/// Each attempt draws a fresh candidate and checks it against both the code
/// and alias namespaces. The check races with concurrent inserts, so the
/// store's unique index remains the final word.
#[derive(Debug, Clone)]
pub struct UniqueCodeGenerator<G = SaltedDigestGenerator> {
    generator: G,
    max_attempts: usize,
}

impl UniqueCodeGenerator<SaltedDigestGenerator> {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(
            SaltedDigestGenerator::with_length(config.code_length),
            config.max_attempts,
        )
    }
}

impl<G: Generator> UniqueCodeGenerator<G> {
    /// Wraps `generator`, trying at most `max_attempts` (at least one) candidates per call.
    pub fn new(generator: G, max_attempts: usize) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// A fresh candidate budget of `max_attempts`.
    pub fn attempts(&self) -> Attempts {
        Attempts {
            used: 0,
            max: self.max_attempts,
        }
    }

    /// Returns a code not taken in `store` at the time of the check.
    pub async fn generate<S>(&self, store: &S, original_url: &str) -> Result<ShortCode>
    where
        S: ReadLinkStore + ?Sized,
    {
        self.generate_within(store, original_url, &mut self.attempts())
            .await
    }

    /// Like [`generate`](Self::generate), drawing candidates from `attempts`.
    ///
    /// Callers that retry after a lost insert race pass the same budget again,
    /// so one assignment never checks more than `max_attempts` candidates.
    pub async fn generate_within<S>(
        &self,
        store: &S,
        original_url: &str,
        attempts: &mut Attempts,
    ) -> Result<ShortCode>
    where
        S: ReadLinkStore + ?Sized,
    {
        while let Some(attempt) = attempts.take() {
            let candidate = self.generator.candidate(original_url);
            if !store.code_exists(candidate.as_str()).await? {
                debug!(code = %candidate, attempt, "generated short code");
                return Ok(candidate);
            }
            debug!(code = %candidate, attempt, "short code collision, regenerating");
        }

        warn!(
            attempts = attempts.used(),
            "exhausted attempts while generating a short code"
        );
        Err(GeneratorError::ExhaustedRetries {
            attempts: attempts.used(),
        })
    }
}

/// Candidate budget for assigning one short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempts {
    used: usize,
    max: usize,
}

impl Attempts {
    /// Candidates drawn so far.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }

    /// Claims the next attempt, numbered from one.
    fn take(&mut self) -> Option<usize> {
        if self.is_exhausted() {
            return None;
        }
        self.used += 1;
        Some(self.used)
    }
}
