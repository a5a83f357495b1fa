use crate::{
    domain::MomentFilter,
    errors::AppError,
    models::{ListParams, MomentsPage, NewMoment},
    AppState,
};
use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 5;

/// Handler for GET /, used by hosting health checks.
pub async fn health() -> &'static str {
    "❤️ Love Unfolds Backend Running ❤️"
}

/// Handler for GET /moments?search=&page=&limit=
pub async fn list_moments(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<MomentsPage>, AppError> {
    let Query(params) = params?;
    let page = params.page.filter(|&p| p > 0).unwrap_or(DEFAULT_PAGE);
    let limit = params.limit.filter(|&l| l > 0).unwrap_or(DEFAULT_LIMIT);
    let skip = (page - 1).saturating_mul(limit);
    let filter = MomentFilter::title_search(params.search.as_deref().unwrap_or_default());

    tracing::debug!(page, limit, ?filter, "Listing moments via handler");
    let slice = state.moment_repo.list(&filter, skip, limit).await?;

    Ok(Json(MomentsPage {
        moments: slice.moments,
        total_pages: slice.total.div_ceil(limit),
        current_page: page,
    }))
}

/// Handler for POST /moments
pub async fn create_moment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewMoment>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(new) = payload?;
    let moment = state.moment_repo.create(new).await?;

    tracing::info!(moment_id = %moment.id, "Moment created successfully via handler");
    Ok((StatusCode::CREATED, Json(moment)))
}

/// Handler for DELETE /moments/{id}. Deleting an unknown id still succeeds.
pub async fn delete_moment(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let moment_id = Uuid::parse_str(&id_str)?;
    state.moment_repo.delete_by_id(moment_id).await?;

    tracing::info!(%moment_id, "Moment deleted via handler");
    Ok(Json(serde_json::json!({ "message": "Moment deleted" })))
}
