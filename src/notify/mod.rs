use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::db::users;
use crate::state::DbPool;

/// Payload handed to the push gateway.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("recipient not found")]
    UnknownRecipient,

    #[error("recipient has no push token")]
    NoPushToken,

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("lookup error: {0}")]
    Lookup(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient_id: &str, notification: &Notification)
        -> Result<(), NotifyError>;
}

/// Delivers notifications through an HTTP push gateway, one JSON POST per
/// message. Token lookup happens here so callers only deal in user ids.
pub struct PushGateway {
    db: DbPool,
    client: reqwest::Client,
    endpoint: Url,
}

impl PushGateway {
    pub fn new(db: DbPool, endpoint: Url) -> Self {
        Self {
            db,
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Notifier for PushGateway {
    async fn send(
        &self,
        recipient_id: &str,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let profile = users::get(&self.db, recipient_id)
            .map_err(|e| NotifyError::Lookup(e.to_string()))?
            .ok_or(NotifyError::UnknownRecipient)?;
        let token = profile.push_token.ok_or(NotifyError::NoPushToken)?;

        let payload = json!({
            "to": token,
            "title": notification.title,
            "body": notification.body,
            "data": notification.data,
            "sound": "default",
            "priority": "high",
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Gateway(format!(
                "gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Notifier used when no gateway is configured. Logs and drops.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipient_id: &str,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            "No push gateway configured; dropping notification for {}: {}",
            recipient_id,
            notification.title
        );
        Ok(())
    }
}

/// Preview length used in review notification bodies.
const PREVIEW_CHARS: usize = 50;

pub fn review_notification(take_id: &str, text: &str, max_probability: f64) -> Notification {
    let preview: String = if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    };

    let confidence = (max_probability * 100.0).round() as i64;
    let mut data = HashMap::new();
    data.insert("type".to_string(), "review_needed".to_string());
    data.insert("takeId".to_string(), take_id.to_string());
    data.insert(
        "toxicityScore".to_string(),
        format!("{max_probability:.2}"),
    );

    Notification {
        title: "Take needs review".to_string(),
        body: format!("Flagged content ({confidence}% confidence): \"{preview}\""),
        data,
    }
}

/// Fan a review notification out to every reviewer except the submitter.
/// Per-recipient failures are logged and swallowed; this must never fail
/// the submission that triggered it.
pub async fn notify_reviewers(
    db: &DbPool,
    notifier: &Arc<dyn Notifier>,
    take_id: &str,
    text: &str,
    author_id: &str,
    max_probability: f64,
) {
    let reviewers = match users::reviewer_ids(db) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Failed to load reviewer list: {}", e);
            return;
        }
    };

    let recipients: Vec<&String> = reviewers.iter().filter(|id| *id != author_id).collect();
    if recipients.is_empty() {
        tracing::debug!("No reviewers to notify for take {}", take_id);
        return;
    }

    let notification = review_notification(take_id, text, max_probability);
    let sends = recipients.into_iter().map(|recipient| {
        let notification = &notification;
        async move {
            match notifier.send(recipient, notification).await {
                Ok(()) => tracing::debug!("Review notification sent to {}", recipient),
                Err(e) => tracing::warn!("Review notification to {} failed: {}", recipient, e),
            }
        }
    });
    futures::future::join_all(sends).await;
}
