use crate::Generator;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hop_core::ShortCode;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of a generated code unless configured otherwise.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Number of random salt bytes mixed into every candidate.
pub const SALT_LEN: usize = 8;

/// Shortest code the generator will produce.
pub const MIN_CODE_LENGTH: usize = 4;

/// A SHA-256 digest is 32 bytes, which encodes to 43 unpadded base64 characters.
pub const MAX_CODE_LENGTH: usize = 43;

/// Generates codes from `sha256(url || salt)` encoded as URL-safe base64.
///
/// The salt is drawn from the operating system RNG on every call, so the
/// salt rather than the URL drives uniqueness: shortening the same URL twice
/// yields two unrelated candidates.
#[derive(Debug, Clone)]
pub struct SaltedDigestGenerator {
    code_length: usize,
}

impl SaltedDigestGenerator {
    pub fn new() -> Self {
        Self::with_length(DEFAULT_CODE_LENGTH)
    }

    /// Creates a generator producing codes of `code_length` characters,
    /// clamped to `4..=43`.
    pub fn with_length(code_length: usize) -> Self {
        Self {
            code_length: code_length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
        }
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }
}

impl Default for SaltedDigestGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the code for a URL and a given salt.
pub fn derive_code(original_url: &str, salt: &[u8], code_length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(original_url.as_bytes());
    hasher.update(salt);
    let digest = hasher.finalize();

    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(code_length.min(MAX_CODE_LENGTH));
    encoded
}

impl Generator for SaltedDigestGenerator {
    fn candidate(&self, original_url: &str) -> ShortCode {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        ShortCode::generated(derive_code(original_url, &salt, self.code_length))
    }
}
