use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The key a link is stored and resolved under.
///
/// Generated codes come from the code generator and are trusted. Custom codes
/// are user-chosen aliases and must be 3-30 characters long, containing only
/// alphanumeric characters, hyphens, or underscores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShortCode {
    /// A system-generated short code.
    Generated(String),
    /// A user-provided custom alias.
    Custom(String),
}

const MIN_ALIAS_LENGTH: usize = 3;
const MAX_ALIAS_LENGTH: usize = 30;

/// Aliases that would shadow the gateway's own top-level routes.
pub const RESERVED_ALIASES: &[&str] = &["health", "links"];

impl ShortCode {
    /// Wraps a code produced by the generator.
    ///
    /// Use this only for codes produced by trusted internal sources.
    pub fn generated(code: impl Into<String>) -> Self {
        Self::Generated(code.into())
    }

    /// Creates a custom alias after validating the input.
    ///
    /// Valid aliases are 3-30 characters, contain only `[a-zA-Z0-9_-]`, and
    /// are not one of [`RESERVED_ALIASES`].
    pub fn custom(alias: impl Into<String>) -> Result<Self, CoreError> {
        let alias = alias.into();
        Self::validate(&alias)?;
        Ok(Self::Custom(alias))
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            ShortCode::Generated(code) => code.as_str(),
            ShortCode::Custom(alias) => alias.as_str(),
        }
    }

    /// Returns the alias if this code was chosen by the caller.
    pub fn alias(&self) -> Option<&str> {
        match self {
            ShortCode::Generated(_) => None,
            ShortCode::Custom(alias) => Some(alias.as_str()),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ShortCode::Custom(_))
    }

    fn validate(alias: &str) -> Result<(), CoreError> {
        if alias.len() < MIN_ALIAS_LENGTH || alias.len() > MAX_ALIAS_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be between {} and {}, got {}",
                MIN_ALIAS_LENGTH,
                MAX_ALIAS_LENGTH,
                alias.len()
            )));
        }

        if !alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                alias
            )));
        }

        if RESERVED_ALIASES.contains(&alias) {
            return Err(CoreError::InvalidShortCode(format!(
                "'{}' is reserved",
                alias
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
