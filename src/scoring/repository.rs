// Score persistence and the feed/ranking read paths. Aggregates on takes
// are denormalized; every score write recomputes them from the full score
// set inside the same transaction.

use rusqlite::{params, Connection};

use crate::error::ApiResult;
use crate::scoring::domain::{self, RatedTake};
use crate::state::DbPool;
use crate::time;

#[derive(Debug, Clone, Copy)]
pub struct ScoreUpsert {
    /// True when the caller had already scored this take.
    pub updated: bool,
    pub total_scores: i64,
    pub average_score: f64,
}

pub fn take_author(pool: &DbPool, take_id: &str) -> ApiResult<Option<String>> {
    let conn = pool.get()?;
    let result = conn.query_row(
        "SELECT author_id FROM takes WHERE id = ?1",
        params![take_id],
        |row| row.get(0),
    );
    match result {
        Ok(author) => Ok(Some(author)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Insert or replace the caller's score, then recompute the take's
/// aggregates from all stored scores. One transaction, so readers never
/// observe a score without its aggregate update.
pub fn upsert_score(
    pool: &DbPool,
    take_id: &str,
    user_id: &str,
    score: i64,
    now: &str,
) -> ApiResult<ScoreUpsert> {
    let conn = pool.get()?;

    conn.execute("BEGIN IMMEDIATE", [])?;

    let result: ApiResult<ScoreUpsert> = (|| {
        let existed: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM scores WHERE take_id = ?1 AND user_id = ?2",
            params![take_id, user_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO scores (take_id, user_id, score, scored_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(take_id, user_id) DO UPDATE SET
               score = excluded.score,
               scored_at = excluded.scored_at",
            params![take_id, user_id, score, now],
        )?;

        let mut stmt = conn.prepare("SELECT score FROM scores WHERE take_id = ?1")?;
        let scores: Vec<i64> = stmt
            .query_map(params![take_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        let (total_scores, average_score) = domain::recompute(&scores);

        conn.execute(
            "UPDATE takes SET total_scores = ?2, average_score = ?3, last_scored_at = ?4
             WHERE id = ?1",
            params![take_id, total_scores, average_score, now],
        )?;

        Ok(ScoreUpsert {
            updated: existed,
            total_scores,
            average_score,
        })
    })();

    match result {
        Ok(outcome) => {
            conn.execute("COMMIT", [])?;
            Ok(outcome)
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(e)
        }
    }
}

const TAKE_COLUMNS: &str = "t.id, t.author_id, t.author_name, t.body, t.created_at, \
                            t.total_scores, t.average_score, s.score";

// Same shape without a viewer join; listings never attach a caller score.
const TAKE_COLUMNS_PLAIN: &str = "t.id, t.author_id, t.author_name, t.body, t.created_at, \
                                  t.total_scores, t.average_score, NULL";

fn map_take(row: &rusqlite::Row<'_>) -> rusqlite::Result<RatedTake> {
    let created_at: String = row.get(4)?;
    let created_at_ms = time::ts_to_millis(&created_at);
    Ok(RatedTake {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        body: row.get(3)?,
        created_at,
        created_at_ms,
        total_scores: row.get(5)?,
        average_score: row.get(6)?,
        caller_score: row.get(7)?,
    })
}

/// Latest approved takes, newest first, with the viewer's own score joined
/// in when a viewer is given.
pub fn recent_approved(
    pool: &DbPool,
    viewer: Option<&str>,
    limit: u32,
) -> ApiResult<Vec<RatedTake>> {
    let conn = pool.get()?;
    let sql = format!(
        "SELECT {TAKE_COLUMNS}
         FROM takes t
         LEFT JOIN scores s ON s.take_id = t.id AND s.user_id = ?1
         ORDER BY t.created_at DESC, t.id DESC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![viewer, limit], map_take)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Newest-first page of approved takes, optionally restricted to one
/// author, with keyset pagination on (created_at, id). An unknown cursor
/// id is ignored and yields the first page.
pub fn list_approved(
    pool: &DbPool,
    author: Option<&str>,
    limit: u32,
    after: Option<&str>,
) -> ApiResult<Vec<RatedTake>> {
    let conn = pool.get()?;
    let cursor = match after {
        Some(id) => created_cursor(&conn, id)?,
        None => None,
    };

    match cursor {
        Some((created_at, id)) => {
            let sql = format!(
                "SELECT {TAKE_COLUMNS_PLAIN}
                 FROM takes t
                 WHERE (?1 IS NULL OR t.author_id = ?1)
                   AND (t.created_at, t.id) < (?2, ?3)
                 ORDER BY t.created_at DESC, t.id DESC
                 LIMIT ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![author, created_at, id, limit], map_take)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        }
        None => {
            let sql = format!(
                "SELECT {TAKE_COLUMNS_PLAIN}
                 FROM takes t
                 WHERE (?1 IS NULL OR t.author_id = ?1)
                 ORDER BY t.created_at DESC, t.id DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![author, limit], map_take)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        }
    }
}

/// All-time ranking page: scored takes only, ordered by score count, then
/// average, then recency, with id as the final tiebreak so the order is
/// total. Cursor semantics as in `list_approved`.
pub fn top_rated(
    pool: &DbPool,
    viewer: Option<&str>,
    limit: u32,
    after: Option<&str>,
) -> ApiResult<Vec<RatedTake>> {
    let conn = pool.get()?;
    let cursor = match after {
        Some(id) => top_cursor(&conn, id)?,
        None => None,
    };

    match cursor {
        Some((total, average, created_at, id)) => {
            let sql = format!(
                "SELECT {TAKE_COLUMNS}
                 FROM takes t
                 LEFT JOIN scores s ON s.take_id = t.id AND s.user_id = ?1
                 WHERE t.total_scores > 0
                   AND (t.total_scores, t.average_score, t.created_at, t.id) < (?2, ?3, ?4, ?5)
                 ORDER BY t.total_scores DESC, t.average_score DESC, t.created_at DESC, t.id DESC
                 LIMIT ?6"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![viewer, total, average, created_at, id, limit],
                    map_take,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        }
        None => {
            let sql = format!(
                "SELECT {TAKE_COLUMNS}
                 FROM takes t
                 LEFT JOIN scores s ON s.take_id = t.id AND s.user_id = ?1
                 WHERE t.total_scores > 0
                 ORDER BY t.total_scores DESC, t.average_score DESC, t.created_at DESC, t.id DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![viewer, limit], map_take)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        }
    }
}

fn created_cursor(conn: &Connection, id: &str) -> ApiResult<Option<(String, String)>> {
    let result = conn.query_row(
        "SELECT created_at, id FROM takes WHERE id = ?1",
        params![id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    );
    match result {
        Ok(keys) => Ok(Some(keys)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn top_cursor(conn: &Connection, id: &str) -> ApiResult<Option<(i64, f64, String, String)>> {
    let result = conn.query_row(
        "SELECT total_scores, average_score, created_at, id FROM takes WHERE id = ?1",
        params![id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    );
    match result {
        Ok(keys) => Ok(Some(keys)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
