use crate::error::Result;
use async_trait::async_trait;
use hop_core::{LinkRecord, LinkStats, Owner};
use jiff::Timestamp;

/// Parameters for creating a link.
#[derive(Debug, Clone)]
pub struct CreateLink {
    /// The destination to shorten. Must be an http or https URL.
    pub original_url: String,
    /// Caller-chosen alias used instead of a generated code.
    pub custom_alias: Option<String>,
    /// When the link stops resolving. `None` keeps it forever.
    pub expires_at: Option<Timestamp>,
    /// `None` creates an anonymous link.
    pub owner: Option<Owner>,
}

impl CreateLink {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            custom_alias: None,
            expires_at: None,
            owner: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.custom_alias = Some(alias.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Operations exposed by the link service.
///
/// The gateway holds the service behind this trait so the storage, cache,
/// and generator choices stay out of its types.
#[async_trait]
pub trait LinkApi: Send + Sync + 'static {
    async fn create_link(&self, request: CreateLink) -> Result<LinkRecord>;

    /// Usage statistics for a code or alias, including expired links.
    async fn get_stats(&self, code_or_alias: &str) -> Result<LinkStats>;

    /// Links of `owner` pointing at `original_url`, newest first.
    async fn search_by_url(&self, original_url: &str, owner: &Owner) -> Result<Vec<LinkRecord>>;

    async fn update_link(
        &self,
        short_code: &str,
        original_url: &str,
        owner: &Owner,
    ) -> Result<LinkRecord>;

    async fn delete_link(&self, short_code: &str, owner: &Owner) -> Result<()>;

    /// Resolves a code or alias to its destination and counts the access.
    async fn resolve(&self, code_or_alias: &str) -> Result<String>;
}
