use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ApiResponse, Reward};
use crate::services::rewards;

use super::social::UserQuery;
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub user_id: String,
    pub date: String,
    pub coins: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub success: bool,
    pub new_balance: u64,
}

/// GET /rewards/pending?userId=
pub async fn pending(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Option<Reward>>>> {
    let reward = rewards::check_pending_reward(state.store.as_ref(), &query.user_id).await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// POST /rewards/claim
///
/// Idempotent: a repeat claim for an already-claimed date answers
/// success=false with the unchanged balance instead of granting twice.
pub async fn claim(
    State(state): State<AppState>,
    Json(body): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>> {
    let outcome = rewards::claim_reward(
        state.store.as_ref(),
        &state.locks,
        &body.user_id,
        &body.date,
        body.coins,
    )
    .await?;

    Ok(Json(ClaimResponse {
        success: outcome.granted,
        new_balance: outcome.balance,
    }))
}
