//! Crowdfunded weekly reward. The pot grows with the number of active
//! players; tiers are a fixed ladder scanned by inclusive lower bound.

use serde::Serialize;

use crate::error::ApiResult;
use crate::state::DbPool;

#[derive(Debug, Clone, Copy)]
pub struct RewardTier {
    pub min_players: u32,
    /// Inclusive upper bound; None for the open-ended top tier.
    pub max_players: Option<u32>,
    /// Weekly payout in whole currency units.
    pub reward: u32,
}

pub const REWARD_TIERS: &[RewardTier] = &[
    RewardTier { min_players: 0, max_players: Some(99), reward: 10 },
    RewardTier { min_players: 100, max_players: Some(199), reward: 15 },
    RewardTier { min_players: 200, max_players: Some(299), reward: 20 },
    RewardTier { min_players: 300, max_players: Some(499), reward: 25 },
    RewardTier { min_players: 500, max_players: Some(999), reward: 50 },
    RewardTier { min_players: 1000, max_players: Some(1999), reward: 75 },
    RewardTier { min_players: 2000, max_players: Some(4999), reward: 100 },
    RewardTier { min_players: 5000, max_players: Some(9999), reward: 150 },
    RewardTier { min_players: 10_000, max_players: None, reward: 200 },
];

#[derive(Debug, Clone, Copy)]
pub struct TierPosition {
    pub current: &'static RewardTier,
    pub next: Option<&'static RewardTier>,
    /// Players still needed to unlock the next tier, 0 at the top.
    pub players_until_next: u32,
}

pub fn tier_for(active_players: u32) -> TierPosition {
    let idx = REWARD_TIERS
        .iter()
        .position(|tier| {
            active_players >= tier.min_players
                && tier.max_players.map_or(true, |max| active_players <= max)
        })
        .unwrap_or(REWARD_TIERS.len() - 1);

    let current = &REWARD_TIERS[idx];
    let next = REWARD_TIERS.get(idx + 1);
    let players_until_next = next.map_or(0, |n| n.min_players.saturating_sub(active_players));

    TierPosition {
        current,
        next,
        players_until_next,
    }
}

/// Lifetime payout bookkeeping, shown alongside the tier info.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardStats {
    pub total_paid_out: f64,
    pub weekly_winners: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_week_winner: Option<String>,
}

impl Default for RewardStats {
    fn default() -> Self {
        Self {
            total_paid_out: 0.0,
            weekly_winners: Vec::new(),
            last_week_winner: None,
        }
    }
}

/// Read the stats singleton, defaulting to zeroes before the first payout
/// is ever recorded.
pub fn reward_stats(pool: &DbPool) -> ApiResult<RewardStats> {
    let conn = pool.get()?;
    let result = conn.query_row(
        "SELECT total_paid_out, weekly_winners, last_week_winner FROM reward_stats WHERE id = 1",
        [],
        |row| {
            let winners_json: String = row.get(1)?;
            Ok(RewardStats {
                total_paid_out: row.get(0)?,
                weekly_winners: serde_json::from_str(&winners_json).unwrap_or_default(),
                last_week_winner: row.get(2)?,
            })
        },
    );
    match result {
        Ok(stats) => Ok(stats),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(RewardStats::default()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
pub(crate) fn seed_stats(pool: &DbPool, stats: &RewardStats) {
    use rusqlite::params;

    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT INTO reward_stats (id, total_paid_out, weekly_winners, last_week_winner)
         VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
           total_paid_out = excluded.total_paid_out,
           weekly_winners = excluded.weekly_winners,
           last_week_winner = excluded.last_week_winner",
        params![
            stats.total_paid_out,
            serde_json::to_string(&stats.weekly_winners).unwrap(),
            stats.last_week_winner,
        ],
    )
    .unwrap();
}
