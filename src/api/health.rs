use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::services::now_ms;
use crate::store::ensure_reset_token;

use super::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub kv: bool,
    pub timestamp: i64,
    pub mode: String,
    pub reset_token: String,
    pub version: String,
}

/// GET /status
///
/// Health plus the reset token. Clients comparing a different token wipe
/// their local state, so the token is minted once and never rotated here.
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let reset_token = ensure_reset_token(state.store.as_ref(), &state.locks).await?;
    let durable = state.store.is_durable();

    Ok(Json(StatusResponse {
        kv: durable,
        timestamp: now_ms(),
        mode: if durable { "kv" } else { "memory" }.to_string(),
        reset_token,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
