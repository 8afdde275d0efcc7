// Presence endpoints. Clients heartbeat while foregrounded and announce
// when they background; the active count is what the reward tier math
// runs on.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiResult;
use crate::extractors::CurrentUser;
use crate::presence;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/presence/heartbeat", post(heartbeat))
        .route("/api/presence/offline", post(offline))
        .route("/api/presence/active", get(active))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceAck {
    pub success: bool,
}

async fn heartbeat(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<Json<PresenceAck>> {
    presence::heartbeat(&state.db, &caller.id, Utc::now())?;
    Ok(Json(PresenceAck { success: true }))
}

async fn offline(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<Json<PresenceAck>> {
    presence::go_offline(&state.db, &caller.id, Utc::now())?;
    Ok(Json(PresenceAck { success: true }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCountResponse {
    pub success: bool,
    pub active_players: u32,
}

async fn active(State(state): State<AppState>) -> ApiResult<Json<ActiveCountResponse>> {
    let count = presence::active_count(&state.db, Utc::now(), state.config.presence.ttl_secs)?;
    Ok(Json(ActiveCountResponse {
        success: true,
        active_players: count,
    }))
}
