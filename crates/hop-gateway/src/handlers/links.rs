use crate::error::Result;
use crate::extract::CallerIdentity;
use crate::model::{CreateLinkRequest, LinkRead, LinkStatsResponse, SearchQuery, UpdateLinkRequest};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hop_service::CreateLink;

pub async fn create_link_handler(
    State(state): State<AppState>,
    caller: Option<CallerIdentity>,
    Json(request): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkRead>)> {
    let record = state
        .links()
        .create_link(CreateLink {
            original_url: request.original_url,
            custom_alias: request.custom_alias,
            expires_at: request.expires_at,
            owner: caller.map(|CallerIdentity(owner)| owner),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkRead::from_record(record, state.base_url())),
    ))
}

pub async fn search_links_handler(
    State(state): State<AppState>,
    CallerIdentity(owner): CallerIdentity,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<LinkRead>>> {
    let records = state
        .links()
        .search_by_url(&query.original_url, &owner)
        .await?;

    Ok(Json(
        records
            .into_iter()
            .map(|record| LinkRead::from_record(record, state.base_url()))
            .collect(),
    ))
}

pub async fn link_stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkStatsResponse>> {
    Ok(Json(state.links().get_stats(&code).await?))
}

pub async fn update_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    CallerIdentity(owner): CallerIdentity,
    Json(request): Json<UpdateLinkRequest>,
) -> Result<Json<LinkRead>> {
    let record = state
        .links()
        .update_link(&code, &request.original_url, &owner)
        .await?;

    Ok(Json(LinkRead::from_record(record, state.base_url())))
}

pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    CallerIdentity(owner): CallerIdentity,
) -> Result<StatusCode> {
    state.links().delete_link(&code, &owner).await?;
    Ok(StatusCode::NO_CONTENT)
}
