use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::models::{ApiResponse, Challenge};
use crate::services::challenges::{self, ChallengeUpdate, NewChallenge};

use super::AppState;

/// POST /challenges
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewChallenge>,
) -> Result<Json<ApiResponse<Challenge>>> {
    let challenge =
        challenges::create_challenge(state.store.as_ref(), &state.locks, body).await?;
    Ok(Json(ApiResponse::success(challenge)))
}

/// GET /challenges/user/{user_id}
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Challenge>>>> {
    let list = challenges::get_challenges(state.store.as_ref(), &user_id).await?;
    Ok(Json(ApiResponse::success(list)))
}

/// POST /challenges/{id}/update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ChallengeUpdate>,
) -> Result<Json<ApiResponse<Challenge>>> {
    let challenge =
        challenges::update_challenge(state.store.as_ref(), &state.locks, &id, patch).await?;
    Ok(Json(ApiResponse::success(challenge)))
}
