// Reviewer endpoints. Every handler re-checks the reviewer flag through
// the review module; the identity headers only prove who is calling.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::classifier::CategoryScore;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::review::{self, QueueEntry};
use crate::state::AppState;
use crate::time;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/review/pending", get(pending))
        .route("/api/review/{id}/approve", post(approve))
        .route("/api/review/{id}/reject", post(reject))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryView {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub user_display_name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub flagged_at: i64,
    pub review_type: String,
    pub toxicity: Vec<CategoryScore>,
    pub max_toxicity: f64,
}

impl From<QueueEntry> for QueueEntryView {
    fn from(entry: QueueEntry) -> Self {
        Self {
            id: entry.id,
            text: entry.body,
            user_id: entry.author_id,
            user_display_name: entry.author_name,
            created_at: time::ts_to_millis(&entry.created_at),
            flagged_at: time::ts_to_millis(&entry.flagged_at),
            review_type: entry.review_type,
            toxicity: entry.toxicity,
            max_toxicity: entry.max_toxicity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    pub success: bool,
    pub entries: Vec<QueueEntryView>,
}

async fn pending(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<Json<PendingResponse>> {
    let entries = review::list_pending(&state, &caller)?;
    Ok(Json(PendingResponse {
        success: true,
        entries: entries.into_iter().map(QueueEntryView::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub success: bool,
    pub message: &'static str,
}

async fn approve(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(take_id): Path<String>,
) -> ApiResult<Json<DecisionResponse>> {
    review::approve(&state, &caller, &take_id)?;
    Ok(Json(DecisionResponse {
        success: true,
        message: "Take approved and published",
    }))
}

/// Body for a rejection. The body itself and `reason` within it may both
/// be omitted; a generic policy message is recorded in their place.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub reason: Option<String>,
}

async fn reject(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(take_id): Path<String>,
    body: Option<ApiJson<RejectRequest>>,
) -> ApiResult<Json<DecisionResponse>> {
    let reason = body.and_then(|ApiJson(req)| req.reason);
    review::reject(&state, &caller, &take_id, reason)?;
    Ok(Json(DecisionResponse {
        success: true,
        message: "Take rejected",
    }))
}
