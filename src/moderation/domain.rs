// Pure moderation rules, no IO. Everything here is deterministic and unit
// testable without a database or model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::ToxicityAnalysis;
use crate::error::ApiError;
use crate::time;

/// Where a take currently lives in the moderation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakeStatus {
    Approved,
    PendingReview,
    Rejected,
}

impl TakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TakeStatus::Approved => "approved",
            TakeStatus::PendingReview => "pending_review",
            TakeStatus::Rejected => "rejected",
        }
    }
}

/// Validate a raw submission body. Returns the trimmed text that will be
/// stored and shown to other users.
pub fn validate_body(raw: &str, max_chars: usize) -> Result<&str, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidArgument("Take cannot be empty".to_string()));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ApiError::InvalidArgument(format!(
            "Take cannot exceed {max_chars} characters"
        )));
    }
    Ok(trimmed)
}

/// Author name shown on a take: stored profile name, then the name carried
/// on the identity token, then "Anonymous". Blank values do not count.
pub fn resolve_display_name(profile_name: Option<String>, token_name: Option<String>) -> String {
    profile_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| token_name.filter(|n| !n.trim().is_empty()))
        .unwrap_or_else(|| "Anonymous".to_string())
}

/// Routing rule: any hard category match sends the take to review, as does
/// a maximum probability at or above the threshold.
pub fn needs_review(analysis: &ToxicityAnalysis, review_threshold: f64) -> bool {
    analysis.has_match() || analysis.max_probability() >= review_threshold
}

/// A validated, classified submission ready to persist.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: String,
    pub analysis: ToxicityAnalysis,
}

impl Submission {
    pub fn new(author_id: &str, author_name: &str, body: &str, analysis: ToxicityAnalysis) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            author_id: author_id.to_string(),
            author_name: author_name.to_string(),
            body: body.to_string(),
            created_at: time::now_ts(),
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CategoryScore;

    fn analysis(matched: bool, probability: f64) -> ToxicityAnalysis {
        ToxicityAnalysis {
            categories: vec![CategoryScore {
                label: "insult".to_string(),
                matched,
                probability,
            }],
        }
    }

    #[test]
    fn validate_trims_surrounding_whitespace() {
        assert_eq!(validate_body("  fine take  ", 150).unwrap(), "fine take");
    }

    #[test]
    fn validate_rejects_empty_and_whitespace_only() {
        assert!(validate_body("", 150).is_err());
        assert!(validate_body("   \n\t ", 150).is_err());
    }

    #[test]
    fn validate_enforces_char_limit_inclusively() {
        let exactly = "a".repeat(150);
        let over = "a".repeat(151);
        assert!(validate_body(&exactly, 150).is_ok());
        assert!(validate_body(&over, 150).is_err());
    }

    #[test]
    fn validate_counts_chars_not_bytes() {
        // 150 two-byte chars is 300 bytes but still within the limit.
        let multibyte = "é".repeat(150);
        assert!(validate_body(&multibyte, 150).is_ok());
    }

    #[test]
    fn validate_limit_applies_after_trim() {
        let padded = format!("   {}   ", "a".repeat(150));
        assert!(validate_body(&padded, 150).is_ok());
    }

    #[test]
    fn display_name_prefers_profile() {
        let name = resolve_display_name(Some("Profile".into()), Some("Token".into()));
        assert_eq!(name, "Profile");
    }

    #[test]
    fn display_name_falls_back_to_token_then_anonymous() {
        assert_eq!(
            resolve_display_name(None, Some("Token".into())),
            "Token"
        );
        assert_eq!(resolve_display_name(None, None), "Anonymous");
    }

    #[test]
    fn display_name_skips_blank_values() {
        assert_eq!(
            resolve_display_name(Some("  ".into()), Some("Token".into())),
            "Token"
        );
        assert_eq!(resolve_display_name(Some("".into()), None), "Anonymous");
    }

    #[test]
    fn review_required_at_threshold() {
        assert!(needs_review(&analysis(false, 0.7), 0.7));
        assert!(!needs_review(&analysis(false, 0.699), 0.7));
    }

    #[test]
    fn review_required_for_any_match_regardless_of_probability() {
        assert!(needs_review(&analysis(true, 0.1), 0.7));
    }

    #[test]
    fn clean_analysis_is_not_flagged() {
        assert!(!needs_review(&ToxicityAnalysis::default(), 0.7));
    }

    #[test]
    fn submissions_get_distinct_sortable_ids() {
        let a = Submission::new("u1", "Ana", "first", ToxicityAnalysis::default());
        let b = Submission::new("u1", "Ana", "second", ToxicityAnalysis::default());
        assert_ne!(a.id, b.id);
        // UUIDv7 ids are time-ordered.
        assert!(a.id < b.id);
    }

    #[test]
    fn status_strings_are_stable() {
        assert_eq!(TakeStatus::Approved.as_str(), "approved");
        assert_eq!(TakeStatus::PendingReview.as_str(), "pending_review");
        assert_eq!(TakeStatus::Rejected.as_str(), "rejected");
    }
}
