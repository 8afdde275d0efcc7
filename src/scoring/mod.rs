pub mod domain;
pub mod repository;

pub use domain::RatedTake;
pub use repository::ScoreUpsert;

use chrono::Utc;

use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::time;

pub const MSG_SCORE_CREATED: &str = "Score submitted successfully!";
pub const MSG_SCORE_UPDATED: &str = "Score updated successfully!";

const FEED_DEFAULT_LIMIT: u32 = 50;
const TOP_DEFAULT_LIMIT: u32 = 20;
const LIST_DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

fn clamp_limit(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

/// Score someone else's take on the 1..=10 scale. Re-scoring replaces the
/// caller's previous score.
pub fn score_take(
    state: &AppState,
    caller: &CurrentUser,
    take_id: &str,
    score: i64,
) -> ApiResult<ScoreUpsert> {
    if !(1..=10).contains(&score) {
        return Err(ApiError::InvalidArgument(
            "Score must be between 1 and 10".to_string(),
        ));
    }

    match repository::take_author(&state.db, take_id)? {
        None => return Err(ApiError::NotFound("Take not found".to_string())),
        Some(author) if author == caller.id => {
            return Err(ApiError::PermissionDenied(
                "You cannot score your own take".to_string(),
            ))
        }
        Some(_) => {}
    }

    repository::upsert_score(&state.db, take_id, &caller.id, score, &time::now_ts())
}

/// The weekly feed: the latest approved takes split into the current
/// epoch-aligned week (ranked) and everything older (submission order).
#[derive(Debug)]
pub struct FeedData {
    pub current_week: Vec<RatedTake>,
    pub previous_weeks: Vec<RatedTake>,
    pub week_start_ms: i64,
}

pub fn feed(state: &AppState, viewer: Option<&str>, limit: Option<u32>) -> ApiResult<FeedData> {
    let limit = clamp_limit(limit, FEED_DEFAULT_LIMIT);
    let rows = repository::recent_approved(&state.db, viewer, limit)?;

    let now_ms = Utc::now().timestamp_millis();
    let (mut current_week, previous_weeks) = domain::split_current_week(rows, now_ms);
    domain::rank_for_week(&mut current_week);

    Ok(FeedData {
        current_week,
        previous_weeks,
        week_start_ms: time::week_start_ms(now_ms),
    })
}

/// One page of the all-time board. `ranked` is true only for the first
/// page; later pages cannot know their global offset cheaply, so they
/// carry no rank numbers.
#[derive(Debug)]
pub struct TopPage {
    pub takes: Vec<RatedTake>,
    pub has_more: bool,
    pub last_id: Option<String>,
    pub ranked: bool,
}

pub fn top(
    state: &AppState,
    viewer: Option<&str>,
    limit: Option<u32>,
    after: Option<&str>,
) -> ApiResult<TopPage> {
    let limit = clamp_limit(limit, TOP_DEFAULT_LIMIT);
    let takes = repository::top_rated(&state.db, viewer, limit, after)?;
    let has_more = takes.len() as u32 == limit;
    let last_id = takes.last().map(|t| t.id.clone());

    Ok(TopPage {
        takes,
        has_more,
        last_id,
        ranked: after.is_none(),
    })
}

/// Chronological listing of approved takes, optionally restricted to one
/// author. Returns the page plus a has-more flag.
pub fn list_takes(
    state: &AppState,
    author: Option<&str>,
    limit: Option<u32>,
    after: Option<&str>,
) -> ApiResult<(Vec<RatedTake>, bool)> {
    let limit = clamp_limit(limit, LIST_DEFAULT_LIMIT);
    let takes = repository::list_approved(&state.db, author, limit, after)?;
    let has_more = takes.len() as u32 == limit;
    Ok((takes, has_more))
}
