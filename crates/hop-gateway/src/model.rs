use hop_core::{LinkRecord, LinkStats};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub original_url: String,
    pub custom_alias: Option<String>,
    /// RFC 3339 timestamp after which the link stops resolving.
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub original_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub original_url: String,
}

/// The public view of a link.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkRead {
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub custom_alias: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl LinkRead {
    pub fn from_record(record: LinkRecord, base_url: &str) -> Self {
        Self {
            short_url: record.short_url(base_url),
            original_url: record.original_url,
            short_code: record.short_code,
            custom_alias: record.custom_alias,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

pub type LinkStatsResponse = LinkStats;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
