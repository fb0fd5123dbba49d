use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ApiResponse, LeaderboardEntry};
use crate::services::leaderboard::{get_user_rank, load_scope};
use crate::services::utc_today;
use crate::store::keys;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeQuery {
    pub map_id: Option<String>,
    pub date: Option<String>,
    pub user_id: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRankResponse {
    pub rank: u32,
    pub score: u64,
    pub user_id: String,
}

fn scope_key(scope: &str, query: &ScopeQuery) -> Result<String> {
    let date = query.date.clone().unwrap_or_else(utc_today);
    let map_id = || {
        query
            .map_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("mapId is required for this scope".to_string()))
    };

    match scope {
        "global" => Ok(keys::lb_global(map_id()?)),
        "daily" => Ok(keys::lb_daily(&date, map_id()?)),
        "daily_challenge" => Ok(keys::lb_daily_challenge(&date)),
        "challenge_global" => Ok(keys::lb_challenge_global(map_id()?)),
        "challenge_daily" => Ok(keys::lb_challenge_daily(&date, map_id()?)),
        other => Err(AppError::BadRequest(format!(
            "invalid leaderboard scope: {other}"
        ))),
    }
}

/// GET /leaderboard/{scope}
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let key = scope_key(&scope, &query)?;
    let list = load_scope(state.store.as_ref(), &key).await?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /leaderboard/me
///
/// Pure lookup into the already-ranked list; null when the caller has no
/// entry in that scope.
pub async fn my_rank(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ApiResponse<Option<MyRankResponse>>>> {
    let scope = query
        .scope
        .clone()
        .ok_or_else(|| AppError::BadRequest("scope is required".to_string()))?;
    let user_id = query
        .user_id
        .clone()
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;

    let key = scope_key(&scope, &query)?;
    let list = load_scope(state.store.as_ref(), &key).await?;
    let hit = get_user_rank(&list, &user_id).map(|r| MyRankResponse {
        rank: r.rank,
        score: r.score,
        user_id: user_id.clone(),
    });
    Ok(Json(ApiResponse::success(hit)))
}
