use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{ApiResponse, LeaderboardEntry};
use crate::services::leaderboard::{self, GameMode, SubmitOutcome};
use crate::services::now_ms;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    pub user_id: String,
    pub name: String,
    pub skin_id: String,
    #[serde(default)]
    pub map_id: String,
    pub mode: GameMode,
    pub score: u64,
}

/// POST /score/submit
///
/// Score values are trusted client input (no validation by design). The
/// response reports the run's rank in each scope its mode wrote, null where
/// the mode writes no such scope or the score fell off a full board.
pub async fn submit_score(
    State(state): State<AppState>,
    Json(req): Json<SubmitScoreRequest>,
) -> Result<Json<ApiResponse<SubmitOutcome>>> {
    if req.user_id.is_empty() {
        return Err(AppError::BadRequest("userId is required".to_string()));
    }
    if req.map_id.is_empty() && req.mode != GameMode::Daily {
        return Err(AppError::BadRequest("mapId is required".to_string()));
    }

    let entry = LeaderboardEntry {
        rank: 0,
        name: req.name,
        score: req.score,
        skin_id: req.skin_id,
        user_id: req.user_id.clone(),
        date: now_ms(),
    };

    let outcome = leaderboard::submit_score(
        state.store.as_ref(),
        &state.locks,
        req.mode,
        &req.map_id,
        entry,
    )
    .await?;

    tracing::debug!(user = %req.user_id, mode = ?req.mode, score = req.score, "Score submitted");
    Ok(Json(ApiResponse::success(outcome)))
}
