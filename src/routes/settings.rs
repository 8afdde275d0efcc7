// Per-user preferences. Reads never fail for new users; they get the
// defaults until something is saved.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::settings::{self, SettingsPatch, UserSettings};
use crate::state::AppState;
use crate::time;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/settings/reset", post(reset_settings))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub success: bool,
    pub settings: UserSettings,
}

async fn get_settings(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<Json<SettingsResponse>> {
    let stored = settings::get(&state.db, &caller.id)?;
    Ok(Json(SettingsResponse {
        success: true,
        settings: stored,
    }))
}

async fn update_settings(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(patch): ApiJson<SettingsPatch>,
) -> ApiResult<Json<SettingsResponse>> {
    let stored = settings::update(&state.db, &caller.id, &patch, &time::now_ts())?;
    Ok(Json(SettingsResponse {
        success: true,
        settings: stored,
    }))
}

async fn reset_settings(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<Json<SettingsResponse>> {
    let stored = settings::reset(&state.db, &caller.id, &time::now_ts())?;
    Ok(Json(SettingsResponse {
        success: true,
        settings: stored,
    }))
}
