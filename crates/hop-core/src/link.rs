use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Surrogate identifier assigned by the link store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub i64);

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of a link owner.
///
/// How the identity was issued or verified is not our concern; two owners
/// are the same exactly when their identifiers are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner(String);

impl Owner {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored short link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: LinkId,
    /// The destination the short code redirects to.
    pub original_url: String,
    /// Unique, immutable key of the link.
    pub short_code: String,
    /// Caller-chosen alias. Unique across both codes and aliases.
    pub custom_alias: Option<String>,
    pub created_at: Timestamp,
    /// When the link stops resolving, if ever.
    pub expires_at: Option<Timestamp>,
    pub last_accessed: Option<Timestamp>,
    pub access_count: u64,
    /// `None` for anonymous links, which can never be updated or deleted.
    pub owner: Option<Owner>,
}

impl LinkRecord {
    /// Whether the link may still be resolved at `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    pub fn is_owned_by(&self, owner: &Owner) -> bool {
        self.owner.as_ref() == Some(owner)
    }

    /// Every key this link may be cached under.
    pub fn cache_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.short_code.as_str()];
        if let Some(alias) = self.custom_alias.as_deref() {
            if alias != self.short_code {
                keys.push(alias);
            }
        }
        keys
    }

    /// Whether `key` names this link exactly, as its code or its alias.
    pub fn answers_to(&self, key: &str) -> bool {
        self.short_code == key || self.custom_alias.as_deref() == Some(key)
    }

    /// The public short URL of this link under `base_url`.
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.short_code)
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            original_url: self.original_url.clone(),
            created_at: self.created_at,
            last_accessed: self.last_accessed,
            access_count: self.access_count,
        }
    }
}

/// A link about to be inserted. The store assigns the id and `created_at`.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub original_url: String,
    pub code: ShortCode,
    pub expires_at: Option<Timestamp>,
    pub owner: Option<Owner>,
}

impl NewLink {
    /// Materialises the record the store persists for this link.
    pub fn into_record(self, id: LinkId, created_at: Timestamp) -> LinkRecord {
        LinkRecord {
            id,
            original_url: self.original_url,
            custom_alias: self.code.alias().map(str::to_owned),
            short_code: self.code.as_str().to_owned(),
            created_at,
            expires_at: self.expires_at,
            last_accessed: None,
            access_count: 0,
            owner: self.owner,
        }
    }
}

/// Usage statistics for a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub original_url: String,
    pub created_at: Timestamp,
    pub last_accessed: Option<Timestamp>,
    pub access_count: u64,
}
