//! Presence tracking. Clients heartbeat while the app is foregrounded; a
//! background sweep flips users offline once their last heartbeat falls
//! out of the TTL window, so the active count stays honest even when apps
//! are killed without a goodbye.

use chrono::{DateTime, Duration, Utc};
use rusqlite::params;

use crate::error::ApiResult;
use crate::state::DbPool;
use crate::time;

pub fn heartbeat(pool: &DbPool, user_id: &str, now: DateTime<Utc>) -> ApiResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO presence (user_id, online, last_seen) VALUES (?1, 1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET
           online = 1,
           last_seen = excluded.last_seen",
        params![user_id, time::fmt_ts(now)],
    )?;
    Ok(())
}

pub fn go_offline(pool: &DbPool, user_id: &str, now: DateTime<Utc>) -> ApiResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO presence (user_id, online, last_seen) VALUES (?1, 0, ?2)
         ON CONFLICT(user_id) DO UPDATE SET
           online = 0,
           last_seen = excluded.last_seen",
        params![user_id, time::fmt_ts(now)],
    )?;
    Ok(())
}

/// Users marked online whose last heartbeat is strictly inside the TTL
/// window.
pub fn active_count(pool: &DbPool, now: DateTime<Utc>, ttl_secs: u64) -> ApiResult<u32> {
    let cutoff = time::fmt_ts(now - Duration::seconds(ttl_secs as i64));
    let conn = pool.get()?;
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM presence WHERE online = 1 AND last_seen > ?1",
        params![cutoff],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mark users offline whose last heartbeat is strictly older than the TTL.
/// Returns how many rows were flipped.
pub fn sweep_stale(pool: &DbPool, now: DateTime<Utc>, ttl_secs: u64) -> ApiResult<usize> {
    let cutoff = time::fmt_ts(now - Duration::seconds(ttl_secs as i64));
    let conn = pool.get()?;
    let swept = conn.execute(
        "UPDATE presence SET online = 0 WHERE online = 1 AND last_seen < ?1",
        params![cutoff],
    )?;
    Ok(swept)
}

/// Periodic sweep task, spawned at startup.
pub async fn run_sweeper(db: DbPool, ttl_secs: u64, sweep_secs: u64) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(sweep_secs.max(1)));
    loop {
        ticker.tick().await;
        match sweep_stale(&db, Utc::now(), ttl_secs) {
            Ok(0) => tracing::debug!("Presence sweep: nothing stale"),
            Ok(n) => tracing::info!("Presence sweep: marked {} user(s) offline", n),
            Err(e) => tracing::error!("Presence sweep failed: {}", e),
        }
    }
}
