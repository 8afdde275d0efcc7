// Pure scoring math: aggregate recomputation, week bucketing, and the
// ranking order used by the weekly feed.

use std::cmp::Ordering;

use crate::time;

/// An approved take with its denormalized score aggregates, as read back
/// for feeds and listings.
#[derive(Debug, Clone)]
pub struct RatedTake {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: String,
    pub created_at_ms: i64,
    pub total_scores: i64,
    pub average_score: f64,
    /// The requesting user's own score, when one was asked for.
    pub caller_score: Option<i64>,
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Recompute aggregates from the full score set: count and mean rounded to
/// two decimals. An empty set resets both to zero.
pub fn recompute(scores: &[i64]) -> (i64, f64) {
    if scores.is_empty() {
        return (0, 0.0);
    }
    let sum: i64 = scores.iter().sum();
    let mean = sum as f64 / scores.len() as f64;
    (scores.len() as i64, round2(mean))
}

/// Split rows into (current week, previous weeks) around the epoch-aligned
/// bucket containing `now_ms`. Input order is preserved within each half.
pub fn split_current_week(rows: Vec<RatedTake>, now_ms: i64) -> (Vec<RatedTake>, Vec<RatedTake>) {
    let week_start = time::week_start_ms(now_ms);
    rows.into_iter()
        .partition(|row| row.created_at_ms >= week_start)
}

/// Competition order for the weekly feed: average descending, then score
/// count descending. Full ties keep their incoming (newest first) order.
pub fn rank_for_week(rows: &mut [RatedTake]) {
    rows.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
            .then(b.total_scores.cmp(&a.total_scores))
    });
}
