// Reward ladder endpoint: current pot, the next rung, and how many more
// active players it takes to get there.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiResult;
use crate::presence;
use crate::rewards::{self, RewardStats, RewardTier};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/rewards", get(current_reward))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierView {
    pub min_players: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    pub reward: u32,
}

impl From<&RewardTier> for TierView {
    fn from(tier: &RewardTier) -> Self {
        Self {
            min_players: tier.min_players,
            max_players: tier.max_players,
            reward: tier.reward,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardResponse {
    pub success: bool,
    pub active_players: u32,
    pub current_tier: TierView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<TierView>,
    pub players_until_next: u32,
    pub stats: RewardStats,
}

async fn current_reward(State(state): State<AppState>) -> ApiResult<Json<RewardResponse>> {
    let active = presence::active_count(&state.db, Utc::now(), state.config.presence.ttl_secs)?;
    let position = rewards::tier_for(active);
    let stats = rewards::reward_stats(&state.db)?;

    Ok(Json(RewardResponse {
        success: true,
        active_players: active,
        current_tier: TierView::from(position.current),
        next_tier: position.next.map(TierView::from),
        players_until_next: position.players_until_next,
        stats,
    }))
}
