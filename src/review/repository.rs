// Repository for the review queue. Terminal decisions move an entry to its
// destination table and delete it from the queue inside one transaction,
// so a crash can never duplicate or orphan a take.

use rusqlite::params;

use crate::classifier::CategoryScore;
use crate::error::{ApiError, ApiResult};
use crate::state::DbPool;

/// A take waiting for review.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: String,
    pub toxicity: Vec<CategoryScore>,
    pub max_toxicity: f64,
    pub review_type: String,
    pub flagged_at: String,
}

/// A terminal review decision.
#[derive(Debug, Clone)]
pub enum Decision {
    Approve {
        reviewer_id: String,
        reviewer_name: String,
    },
    Reject {
        reviewer_id: String,
        reviewer_name: String,
        reason: String,
    },
}

/// Oldest-flagged-last page of the queue. The queue is expected to stay
/// small; reviewers work from a single fixed-size page.
pub fn list_pending(pool: &DbPool, limit: u32) -> ApiResult<Vec<QueueEntry>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, author_id, author_name, body, created_at,
                toxicity, max_toxicity, review_type, flagged_at
         FROM review_queue
         ORDER BY flagged_at DESC
         LIMIT ?1",
    )?;

    let entries = stmt
        .query_map(params![limit], |row| {
            let toxicity_json: String = row.get(5)?;
            Ok(QueueEntry {
                id: row.get(0)?,
                author_id: row.get(1)?,
                author_name: row.get(2)?,
                body: row.get(3)?,
                created_at: row.get(4)?,
                toxicity: serde_json::from_str(&toxicity_json).unwrap_or_default(),
                max_toxicity: row.get(6)?,
                review_type: row.get(7)?,
                flagged_at: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Apply a decision to a queue entry. The destination insert and the queue
/// delete commit together or not at all.
pub fn apply_decision(
    pool: &DbPool,
    take_id: &str,
    decision: &Decision,
    now: &str,
) -> ApiResult<()> {
    let conn = pool.get()?;

    conn.execute("BEGIN IMMEDIATE", [])?;

    let result: ApiResult<()> = (|| {
        let moved = match decision {
            Decision::Approve {
                reviewer_id,
                reviewer_name,
            } => conn.execute(
                "INSERT INTO takes (id, author_id, author_name, body, created_at, status,
                                    toxicity, max_toxicity, analyzed_at,
                                    approved_at, approved_by, approver_name)
                 SELECT id, author_id, author_name, body, created_at, 'approved',
                        toxicity, max_toxicity, analyzed_at, ?2, ?3, ?4
                 FROM review_queue WHERE id = ?1",
                params![take_id, now, reviewer_id, reviewer_name],
            )?,
            Decision::Reject {
                reviewer_id,
                reviewer_name,
                reason,
            } => conn.execute(
                "INSERT INTO rejected_takes (id, author_id, author_name, body, created_at,
                                             toxicity, max_toxicity, analyzed_at,
                                             rejection_reason, rejected_by, reviewer_name, rejected_at)
                 SELECT id, author_id, author_name, body, created_at,
                        toxicity, max_toxicity, analyzed_at, ?2, ?3, ?4, ?5
                 FROM review_queue WHERE id = ?1",
                params![take_id, reason, reviewer_id, reviewer_name, now],
            )?,
        };

        if moved == 0 {
            return Err(ApiError::NotFound(
                "Take not found in review queue".to_string(),
            ));
        }

        conn.execute("DELETE FROM review_queue WHERE id = ?1", params![take_id])?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute("COMMIT", [])?;
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ToxicityAnalysis;
    use crate::db::test_pool;
    use crate::moderation::domain::Submission;
    use crate::moderation::repository::insert_queued;

    fn queued(pool: &DbPool, body: &str, created_at: &str) -> String {
        let mut submission = Submission::new("author", "Ana", body, ToxicityAnalysis::default());
        submission.created_at = created_at.to_string();
        insert_queued(pool, &submission).unwrap();
        submission.id
    }

    fn approve() -> Decision {
        Decision::Approve {
            reviewer_id: "rev".to_string(),
            reviewer_name: "Rev".to_string(),
        }
    }

    fn table_count(pool: &DbPool, table: &str) -> i64 {
        let conn = pool.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn approve_moves_entry_to_takes_with_stamps() {
        let pool = test_pool();
        let id = queued(&pool, "spicy", "2025-01-01T00:00:00.000Z");

        apply_decision(&pool, &id, &approve(), "2025-01-02T00:00:00.000Z").unwrap();

        assert_eq!(table_count(&pool, "review_queue"), 0);
        assert_eq!(table_count(&pool, "takes"), 1);

        let conn = pool.get().unwrap();
        let (status, approved_at, approved_by, approver_name): (String, String, String, String) =
            conn.query_row(
                "SELECT status, approved_at, approved_by, approver_name FROM takes WHERE id = ?1",
                [&id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(status, "approved");
        assert_eq!(approved_at, "2025-01-02T00:00:00.000Z");
        assert_eq!(approved_by, "rev");
        assert_eq!(approver_name, "Rev");
    }

    #[test]
    fn reject_moves_entry_to_rejected_with_reason() {
        let pool = test_pool();
        let id = queued(&pool, "spicy", "2025-01-01T00:00:00.000Z");

        apply_decision(
            &pool,
            &id,
            &Decision::Reject {
                reviewer_id: "rev".to_string(),
                reviewer_name: "Rev".to_string(),
                reason: "Too mean".to_string(),
            },
            "2025-01-02T00:00:00.000Z",
        )
        .unwrap();

        assert_eq!(table_count(&pool, "review_queue"), 0);
        assert_eq!(table_count(&pool, "takes"), 0);
        assert_eq!(table_count(&pool, "rejected_takes"), 1);

        let conn = pool.get().unwrap();
        let reason: String = conn
            .query_row(
                "SELECT rejection_reason FROM rejected_takes WHERE id = ?1",
                [&id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(reason, "Too mean");
    }

    #[test]
    fn missing_entry_is_not_found() {
        let pool = test_pool();
        let err = apply_decision(&pool, "ghost", &approve(), "2025-01-02T00:00:00.000Z")
            .unwrap_err();
        assert_eq!(err.kind(), "not-found");
    }

    #[test]
    fn decision_is_idempotent_only_by_failing_the_second_call() {
        let pool = test_pool();
        let id = queued(&pool, "spicy", "2025-01-01T00:00:00.000Z");

        apply_decision(&pool, &id, &approve(), "2025-01-02T00:00:00.000Z").unwrap();
        let err = apply_decision(&pool, &id, &approve(), "2025-01-02T00:00:01.000Z").unwrap_err();
        assert_eq!(err.kind(), "not-found");
        assert_eq!(table_count(&pool, "takes"), 1);
    }

    #[test]
    fn failed_move_leaves_queue_untouched() {
        let pool = test_pool();
        let id = queued(&pool, "spicy", "2025-01-01T00:00:00.000Z");

        // Occupy the destination id so the insert conflicts mid-transaction.
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO takes (id, author_id, author_name, body, created_at)
             VALUES (?1, 'other', 'Bo', 'occupied', '2024-12-31T00:00:00.000Z')",
            [&id],
        )
        .unwrap();
        drop(conn);

        assert!(apply_decision(&pool, &id, &approve(), "2025-01-02T00:00:00.000Z").is_err());

        // The queue entry survives the rollback.
        assert_eq!(table_count(&pool, "review_queue"), 1);
    }

    #[test]
    fn list_pending_orders_newest_flagged_first_and_caps() {
        let pool = test_pool();
        queued(&pool, "first", "2025-01-01T00:00:00.000Z");
        queued(&pool, "second", "2025-01-02T00:00:00.000Z");
        queued(&pool, "third", "2025-01-03T00:00:00.000Z");

        let entries = list_pending(&pool, 2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].body, "third");
        assert_eq!(entries[1].body, "second");
        assert_eq!(entries[0].review_type, "toxicity");
    }
}
