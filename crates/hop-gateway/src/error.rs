use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hop_service::LinkError;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Link(LinkError),
    /// The route needs a caller identity and none was sent.
    MissingIdentity,
    /// The identity header was present but unusable.
    InvalidIdentity(String),
}

impl From<LinkError> for AppError {
    fn from(value: LinkError) -> Self {
        AppError::Link(value)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Link(err) => match err {
                LinkError::AliasConflict(_)
                | LinkError::InvalidUrl(_)
                | LinkError::InvalidAlias(_) => StatusCode::BAD_REQUEST,
                LinkError::NotFound(_) => StatusCode::NOT_FOUND,
                LinkError::Forbidden(_) => StatusCode::FORBIDDEN,
                LinkError::ExhaustedRetries { .. } => StatusCode::SERVICE_UNAVAILABLE,
                LinkError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::MissingIdentity | AppError::InvalidIdentity(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Link(LinkError::Storage(err)) => {
                error!(error = %err, "storage failure while handling request");
                "internal server error".to_string()
            }
            AppError::Link(err) => err.to_string(),
            AppError::MissingIdentity => "missing caller identity".to_string(),
            AppError::InvalidIdentity(reason) => format!("invalid caller identity: {reason}"),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
