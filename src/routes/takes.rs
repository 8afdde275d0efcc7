// Take submission and listings. These are the endpoints the mobile client
// calls most; request/response shapes are explicit structs, camelCase on
// the wire.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiQuery, CurrentUser, MaybeUser};
use crate::moderation::{self, TakeStatus};
use crate::scoring::{self, RatedTake, ScoreUpsert};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/takes", post(submit).get(list_public))
        .route("/api/takes/mine", get(list_mine))
        .route("/api/takes/top", get(top))
        .route("/api/takes/{id}/score", post(score))
}

/// One take as clients see it. `user_score` is only present when the
/// caller is authenticated: their score, or null if they have not scored
/// this take yet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeView {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub user_display_name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub total_scores: i64,
    pub average_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_score: Option<Option<i64>>,
}

impl TakeView {
    pub fn from_take(take: RatedTake, authenticated: bool) -> Self {
        Self {
            id: take.id,
            text: take.body,
            user_id: take.author_id,
            user_display_name: take.author_name,
            created_at: take.created_at_ms,
            total_scores: take.total_scores,
            average_score: take.average_score,
            user_score: authenticated.then_some(take.caller_score),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTakeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTakeResponse {
    pub success: bool,
    pub take_id: String,
    pub status: TakeStatus,
    pub message: &'static str,
}

async fn submit(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(req): ApiJson<SubmitTakeRequest>,
) -> ApiResult<Json<SubmitTakeResponse>> {
    let outcome = moderation::submit(&state, &caller, &req.text).await?;
    Ok(Json(SubmitTakeResponse {
        success: true,
        take_id: outcome.take_id,
        status: outcome.status,
        message: outcome.message,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTakesQuery {
    pub limit: Option<u32>,
    /// Id of the last take of the previous page.
    pub start_after: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTakesResponse {
    pub success: bool,
    pub takes: Vec<TakeView>,
    pub has_more: bool,
}

async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListTakesQuery>,
) -> ApiResult<Json<ListTakesResponse>> {
    let (takes, has_more) =
        scoring::list_takes(&state, None, query.limit, query.start_after.as_deref())?;
    Ok(Json(ListTakesResponse {
        success: true,
        takes: takes
            .into_iter()
            .map(|t| TakeView::from_take(t, false))
            .collect(),
        has_more,
    }))
}

async fn list_mine(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiQuery(query): ApiQuery<ListTakesQuery>,
) -> ApiResult<Json<ListTakesResponse>> {
    let (takes, has_more) = scoring::list_takes(
        &state,
        Some(&caller.id),
        query.limit,
        query.start_after.as_deref(),
    )?;
    Ok(Json(ListTakesResponse {
        success: true,
        takes: takes
            .into_iter()
            .map(|t| TakeView::from_take(t, false))
            .collect(),
        has_more,
    }))
}

/// All-time entry. Rank is only assigned on the first page; a cursored
/// window cannot know its global offset without counting everything ahead
/// of it, so later pages simply omit it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTakeView {
    #[serde(flatten)]
    pub take: TakeView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTakesResponse {
    pub success: bool,
    pub takes: Vec<TopTakeView>,
    pub has_more: bool,
    pub last_id: Option<String>,
}

async fn top(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(query): ApiQuery<ListTakesQuery>,
) -> ApiResult<Json<TopTakesResponse>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let page = scoring::top(&state, viewer_id, query.limit, query.start_after.as_deref())?;

    let ranked = page.ranked;
    let takes = page
        .takes
        .into_iter()
        .enumerate()
        .map(|(i, take)| TopTakeView {
            take: TakeView::from_take(take, viewer_id.is_some()),
            rank: ranked.then_some(i + 1),
        })
        .collect();

    Ok(Json(TopTakesResponse {
        success: true,
        takes,
        has_more: page.has_more,
        last_id: page.last_id,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    /// Whole number 1..=10. Fractional JSON values fail deserialization.
    pub score: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub success: bool,
    pub message: &'static str,
    pub total_scores: i64,
    pub average_score: f64,
}

async fn score(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(take_id): Path<String>,
    ApiJson(req): ApiJson<ScoreRequest>,
) -> ApiResult<Json<ScoreResponse>> {
    let ScoreUpsert {
        updated,
        total_scores,
        average_score,
    } = scoring::score_take(&state, &caller, &take_id, req.score)?;

    Ok(Json(ScoreResponse {
        success: true,
        message: if updated {
            scoring::MSG_SCORE_UPDATED
        } else {
            scoring::MSG_SCORE_CREATED
        },
        total_scores,
        average_score,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(caller_score: Option<i64>) -> RatedTake {
        RatedTake {
            id: "t1".to_string(),
            author_id: "u1".to_string(),
            author_name: "Ana".to_string(),
            body: "spicy".to_string(),
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
            created_at_ms: 1_735_689_600_000,
            total_scores: 2,
            average_score: 7.5,
            caller_score,
        }
    }

    #[test]
    fn anonymous_view_omits_user_score() {
        let json = serde_json::to_value(TakeView::from_take(take(None), false)).unwrap();
        assert!(json.get("userScore").is_none());
        assert_eq!(json["text"], "spicy");
        assert_eq!(json["userDisplayName"], "Ana");
        assert_eq!(json["createdAt"], 1_735_689_600_000i64);
    }

    #[test]
    fn authenticated_view_carries_null_until_scored() {
        let json = serde_json::to_value(TakeView::from_take(take(None), true)).unwrap();
        assert!(json["userScore"].is_null());

        let json = serde_json::to_value(TakeView::from_take(take(Some(8)), true)).unwrap();
        assert_eq!(json["userScore"], 8);
    }

    #[test]
    fn top_view_flattens_and_ranks_only_when_asked() {
        let ranked = TopTakeView {
            take: TakeView::from_take(take(None), false),
            rank: Some(3),
        };
        let json = serde_json::to_value(&ranked).unwrap();
        assert_eq!(json["rank"], 3);
        assert_eq!(json["id"], "t1");

        let unranked = TopTakeView {
            take: TakeView::from_take(take(None), false),
            rank: None,
        };
        let json = serde_json::to_value(&unranked).unwrap();
        assert!(json.get("rank").is_none());
    }

    #[test]
    fn score_request_rejects_fractional_values() {
        assert!(serde_json::from_str::<ScoreRequest>(r#"{"score":7}"#).is_ok());
        assert!(serde_json::from_str::<ScoreRequest>(r#"{"score":7.5}"#).is_err());
        assert!(serde_json::from_str::<ScoreRequest>(r#"{"score":"7"}"#).is_err());
    }
}
