use crate::error::StorageError;
use crate::link::{LinkId, LinkRecord, NewLink, Owner};
use async_trait::async_trait;
use jiff::Timestamp;

/// Result type for link store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Read access to the durable link store.
///
/// Lookups named `code_or_alias` match a record whose `short_code` or
/// `custom_alias` equals the token.
#[async_trait]
pub trait ReadLinkStore: Send + Sync + 'static {
    /// Checks whether any record, expired or not, owns the token as a code or alias.
    async fn code_exists(&self, code_or_alias: &str) -> Result<bool>;

    /// Fetches the record for the token if it has not expired at `now`.
    async fn find_active(&self, code_or_alias: &str, now: Timestamp)
        -> Result<Option<LinkRecord>>;

    /// Fetches the record for the token regardless of expiry.
    async fn find_any(&self, code_or_alias: &str) -> Result<Option<LinkRecord>>;

    /// Fetches the record with exactly this short code, regardless of owner.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<LinkRecord>>;

    /// Lists the owner's links pointing at `original_url`, newest first.
    async fn search_by_url(&self, original_url: &str, owner: &Owner) -> Result<Vec<LinkRecord>>;
}

/// The durable, authoritative link store.
///
/// Every mutation is atomic: it is either fully applied or not observable.
#[async_trait]
pub trait LinkStore: ReadLinkStore {
    /// Inserts a new link. Returns `Err(Conflict)` if the code or alias is taken.
    async fn insert(&self, link: NewLink) -> Result<LinkRecord>;

    /// Increments `access_count` and sets `last_accessed` in one step.
    /// Returns `false` if the record no longer exists.
    async fn record_access(&self, id: LinkId, at: Timestamp) -> Result<bool>;

    /// Replaces `original_url` and returns the updated record, or `None` if it is gone.
    async fn update_url(&self, id: LinkId, original_url: &str) -> Result<Option<LinkRecord>>;

    /// Deletes the record. Returns `true` if it existed and was removed.
    async fn delete(&self, id: LinkId) -> Result<bool>;
}
