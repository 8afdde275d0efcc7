// The weekly feed: current-week takes ranked by average score, older
// takes trailing in submission order.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::{ApiQuery, MaybeUser};
use crate::routes::takes::TakeView;
use crate::scoring::{self, RatedTake};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/feed", get(feed))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub limit: Option<u32>,
}

/// A current-week entry carries its 1-based rank and the size of the week
/// bucket it was ranked within.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTakeView {
    #[serde(flatten)]
    pub take: TakeView,
    pub rank: usize,
    pub weekly_take_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub success: bool,
    pub current_week: Vec<RankedTakeView>,
    pub previous_weeks: Vec<TakeView>,
    pub total_takes: usize,
    /// Start of the current week bucket, ms since the Unix epoch.
    pub week_start: i64,
}

async fn feed(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> ApiResult<Json<FeedResponse>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let data = scoring::feed(&state, viewer_id, query.limit)?;

    let authenticated = viewer_id.is_some();
    let week_size = data.current_week.len();
    let current_week: Vec<RankedTakeView> = data
        .current_week
        .into_iter()
        .enumerate()
        .map(|(i, take): (usize, RatedTake)| RankedTakeView {
            take: TakeView::from_take(take, authenticated),
            rank: i + 1,
            weekly_take_count: week_size,
        })
        .collect();
    let previous_weeks: Vec<TakeView> = data
        .previous_weeks
        .into_iter()
        .map(|t| TakeView::from_take(t, authenticated))
        .collect();

    Ok(Json(FeedResponse {
        success: true,
        total_takes: current_week.len() + previous_weeks.len(),
        current_week,
        previous_weeks,
        week_start: data.week_start_ms,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(id: &str) -> TakeView {
        TakeView {
            id: id.to_string(),
            text: "spicy".to_string(),
            user_id: "u1".to_string(),
            user_display_name: "Ana".to_string(),
            created_at: 1_735_689_600_000,
            total_scores: 1,
            average_score: 8.0,
            user_score: None,
        }
    }

    #[test]
    fn ranked_view_flattens_take_fields() {
        let view = RankedTakeView {
            take: take("t1"),
            rank: 2,
            weekly_take_count: 5,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], "t1");
        assert_eq!(json["rank"], 2);
        assert_eq!(json["weeklyTakeCount"], 5);
    }

    #[test]
    fn response_counts_both_partitions() {
        let response = FeedResponse {
            success: true,
            current_week: vec![RankedTakeView {
                take: take("t1"),
                rank: 1,
                weekly_take_count: 1,
            }],
            previous_weeks: vec![take("t2"), take("t3")],
            total_takes: 3,
            week_start: 0,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalTakes"], 3);
        assert_eq!(json["currentWeek"].as_array().unwrap().len(), 1);
        assert_eq!(json["previousWeeks"].as_array().unwrap().len(), 2);
    }
}
