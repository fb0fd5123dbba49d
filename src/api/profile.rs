use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{AppError, Result};
use crate::models::{ApiResponse, UserProfile};
use crate::services::profile_merge;
use crate::store::{get_json, keys};

use super::AppState;

/// GET /user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile: UserProfile = get_json(state.store.as_ref(), &keys::user(&id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    Ok(Json(ApiResponse::success(profile)))
}

/// POST /user/sync
///
/// Merge-and-save. The body is the client's (possibly stale) profile
/// snapshot; the response carries the post-merge profile the client should
/// adopt.
pub async fn sync_user(
    State(state): State<AppState>,
    Json(snapshot): Json<UserProfile>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let merged = profile_merge::sync_profile(state.store.as_ref(), &state.locks, snapshot).await?;
    Ok(Json(ApiResponse::success(merged)))
}
