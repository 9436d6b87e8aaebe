use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use hop_core::Owner;

use crate::error::AppError;

/// Header carrying the authenticated caller's identifier.
///
/// Identity is issued and verified upstream; the gateway only forwards it.
pub const CALLER_ID_HEADER: &str = "x-caller-id";

/// The caller's identity taken from [`CALLER_ID_HEADER`].
///
/// Extracting `CallerIdentity` rejects requests without the header with
/// `401`. Extract `Option<CallerIdentity>` on routes where identity is
/// optional.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Owner);

fn caller_from_parts(parts: &Parts) -> Result<Option<CallerIdentity>, AppError> {
    let Some(value) = parts.headers.get(CALLER_ID_HEADER) else {
        return Ok(None);
    };

    let id = value
        .to_str()
        .map_err(|_| AppError::InvalidIdentity("header is not visible ASCII".to_string()))?
        .trim();
    if id.is_empty() {
        return Err(AppError::InvalidIdentity("header is empty".to_string()));
    }

    Ok(Some(CallerIdentity(Owner::new(id))))
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_parts(parts)?.ok_or(AppError::MissingIdentity)
    }
}

impl<S> OptionalFromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        caller_from_parts(parts)
    }
}
