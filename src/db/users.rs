use rusqlite::params;

use crate::error::ApiResult;
use crate::state::DbPool;
use crate::time;

/// Profile row for a known user. Users are provisioned lazily; most
/// lookups must tolerate an absent row.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub reviewer: bool,
    pub push_token: Option<String>,
}

pub fn get(pool: &DbPool, user_id: &str) -> ApiResult<Option<UserProfile>> {
    let conn = pool.get()?;
    let result = conn.query_row(
        "SELECT id, display_name, reviewer, push_token FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(UserProfile {
                id: row.get(0)?,
                display_name: row.get(1)?,
                reviewer: row.get(2)?,
                push_token: row.get(3)?,
            })
        },
    );
    match result {
        Ok(profile) => Ok(Some(profile)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert or update a profile, preserving the original created_at.
pub fn upsert(pool: &DbPool, profile: &UserProfile) -> ApiResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO users (id, display_name, reviewer, push_token, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            display_name = excluded.display_name,
            reviewer = excluded.reviewer,
            push_token = excluded.push_token",
        params![
            profile.id,
            profile.display_name,
            profile.reviewer,
            profile.push_token,
            time::now_ts(),
        ],
    )?;
    Ok(())
}

/// Display name from the stored profile, if any. Empty strings count as
/// absent so the caller's fallback chain kicks in.
pub fn display_name(pool: &DbPool, user_id: &str) -> ApiResult<Option<String>> {
    Ok(get(pool, user_id)?
        .and_then(|p| p.display_name)
        .filter(|name| !name.trim().is_empty()))
}

pub fn reviewer_ids(pool: &DbPool) -> ApiResult<Vec<String>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT id FROM users WHERE reviewer = 1")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}
