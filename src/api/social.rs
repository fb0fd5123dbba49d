use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{ApiResponse, FriendView};
use crate::services::social;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub user_id: String,
    pub friend_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondBody {
    pub user_id: String,
    pub request_id: String,
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBody {
    pub user_id: String,
    pub friend_id: String,
}

/// GET /friends?userId=
pub async fn list_friends(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Vec<FriendView>>>> {
    let friends = social::get_friends(state.store.as_ref(), &query.user_id).await?;
    Ok(Json(ApiResponse::success(friends)))
}

/// POST /friends/request
pub async fn request_friend(
    State(state): State<AppState>,
    Json(body): Json<FriendRequestBody>,
) -> Result<Json<ApiResponse<()>>> {
    social::add_friend_request(
        state.store.as_ref(),
        &state.locks,
        &body.user_id,
        &body.friend_code,
    )
    .await?;
    Ok(Json(ApiResponse::success(())))
}

/// POST /friends/respond
pub async fn respond_request(
    State(state): State<AppState>,
    Json(body): Json<RespondBody>,
) -> Result<Json<ApiResponse<()>>> {
    social::respond_to_friend_request(
        state.store.as_ref(),
        &state.locks,
        &body.user_id,
        &body.request_id,
        body.accept,
    )
    .await?;
    Ok(Json(ApiResponse::success(())))
}

/// DELETE /friends
pub async fn remove_friend(
    State(state): State<AppState>,
    Json(body): Json<RemoveBody>,
) -> Result<Json<ApiResponse<()>>> {
    social::remove_friend(
        state.store.as_ref(),
        &state.locks,
        &body.user_id,
        &body.friend_id,
    )
    .await?;
    Ok(Json(ApiResponse::success(())))
}
