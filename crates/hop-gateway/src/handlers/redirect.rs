use crate::error::Result;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Redirect;
use tracing::debug;

pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let url = state.links().resolve(&code).await?;
    debug!(code = %code, "redirecting");
    Ok(Redirect::temporary(&url))
}
