// Persistence for freshly moderated submissions. A submission lands in
// exactly one collection: takes when it cleared moderation, review_queue
// when it was flagged.

use rusqlite::params;

use crate::error::ApiResult;
use crate::moderation::domain::Submission;
use crate::state::DbPool;

pub fn insert_approved(pool: &DbPool, submission: &Submission) -> ApiResult<()> {
    let conn = pool.get()?;
    let toxicity = serde_json::to_string(&submission.analysis.categories)?;

    conn.execute(
        "INSERT INTO takes (id, author_id, author_name, body, created_at, status,
                            toxicity, max_toxicity, analyzed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'approved', ?6, ?7, ?5)",
        params![
            submission.id,
            submission.author_id,
            submission.author_name,
            submission.body,
            submission.created_at,
            toxicity,
            submission.analysis.max_probability(),
        ],
    )?;
    Ok(())
}

pub fn insert_queued(pool: &DbPool, submission: &Submission) -> ApiResult<()> {
    let conn = pool.get()?;
    let toxicity = serde_json::to_string(&submission.analysis.categories)?;

    conn.execute(
        "INSERT INTO review_queue (id, author_id, author_name, body, created_at,
                                   toxicity, max_toxicity, analyzed_at, review_type, flagged_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?5, 'toxicity', ?5)",
        params![
            submission.id,
            submission.author_id,
            submission.author_name,
            submission.body,
            submission.created_at,
            toxicity,
            submission.analysis.max_probability(),
        ],
    )?;
    Ok(())
}
