pub mod domain;
pub mod repository;

pub use domain::{Submission, TakeStatus};

use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::notify;
use crate::state::AppState;

pub const MSG_APPROVED: &str = "Take submitted successfully!";
pub const MSG_PENDING: &str =
    "Take submitted and is under review. You'll be notified once it's approved!";

#[derive(Debug)]
pub struct SubmitOutcome {
    pub take_id: String,
    pub status: TakeStatus,
    pub message: &'static str,
}

/// Submit a take: validate, classify, then route to the public feed or the
/// review queue. Reviewer notification is fire and forget; the submission
/// succeeds whether or not anyone can be notified.
pub async fn submit(state: &AppState, caller: &CurrentUser, raw_body: &str) -> ApiResult<SubmitOutcome> {
    let body = domain::validate_body(raw_body, state.config.moderation.max_take_chars)?;

    let profile_name = users::display_name(&state.db, &caller.id)?;
    let author_name = domain::resolve_display_name(profile_name, caller.display_name.clone());

    let analysis = state.classifier.analyze(body).await.map_err(|e| {
        ApiError::Internal(format!("Toxicity analysis failed: {e}"))
    })?;

    let submission = Submission::new(&caller.id, &author_name, body, analysis);

    if domain::needs_review(&submission.analysis, state.config.moderation.review_threshold) {
        repository::insert_queued(&state.db, &submission)?;
        tracing::info!(
            "Take {} flagged for review (max toxicity {:.4})",
            submission.id,
            submission.analysis.max_probability()
        );

        let db = state.db.clone();
        let notifier = state.notifier.clone();
        let take_id = submission.id.clone();
        let text = submission.body.clone();
        let author_id = submission.author_id.clone();
        let max_probability = submission.analysis.max_probability();
        tokio::spawn(async move {
            notify::notify_reviewers(&db, &notifier, &take_id, &text, &author_id, max_probability)
                .await;
        });

        Ok(SubmitOutcome {
            take_id: submission.id,
            status: TakeStatus::PendingReview,
            message: MSG_PENDING,
        })
    } else {
        repository::insert_approved(&state.db, &submission)?;
        tracing::info!("Take {} approved", submission.id);

        Ok(SubmitOutcome {
            take_id: submission.id,
            status: TakeStatus::Approved,
            message: MSG_APPROVED,
        })
    }
}
