pub mod repository;

pub use repository::{Decision, QueueEntry};

use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::time;

pub const DEFAULT_REJECTION_REASON: &str = "Content policy violation";

/// Page size for the pending queue.
const PENDING_PAGE: u32 = 50;

/// Every review operation starts here. Returns the reviewer's display name
/// for audit stamps.
fn require_reviewer(state: &AppState, caller: &CurrentUser) -> ApiResult<String> {
    match users::get(&state.db, &caller.id)? {
        Some(profile) if profile.reviewer => Ok(profile
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Reviewer".to_string())),
        _ => Err(ApiError::PermissionDenied(
            "User is not authorized to review takes".to_string(),
        )),
    }
}

pub fn list_pending(state: &AppState, caller: &CurrentUser) -> ApiResult<Vec<QueueEntry>> {
    require_reviewer(state, caller)?;
    repository::list_pending(&state.db, PENDING_PAGE)
}

pub fn approve(state: &AppState, caller: &CurrentUser, take_id: &str) -> ApiResult<()> {
    let reviewer_name = require_reviewer(state, caller)?;
    let decision = Decision::Approve {
        reviewer_id: caller.id.clone(),
        reviewer_name,
    };
    repository::apply_decision(&state.db, take_id, &decision, &time::now_ts())?;
    tracing::info!("Take {} approved by {}", take_id, caller.id);
    Ok(())
}

pub fn reject(
    state: &AppState,
    caller: &CurrentUser,
    take_id: &str,
    reason: Option<String>,
) -> ApiResult<()> {
    let reviewer_name = require_reviewer(state, caller)?;
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

    let decision = Decision::Reject {
        reviewer_id: caller.id.clone(),
        reviewer_name,
        reason,
    };
    repository::apply_decision(&state.db, take_id, &decision, &time::now_ts())?;
    tracing::info!("Take {} rejected by {}", take_id, caller.id);
    Ok(())
}
