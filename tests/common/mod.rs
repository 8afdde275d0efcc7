// Shared harness for the integration suites: the real router over a real
// on-disk SQLite database, requests dispatched through tower's oneshot.
// Each suite uses its own subset of the helpers.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use takeboard::classifier::lexicon::LexiconModel;
use takeboard::classifier::Classifier;
use takeboard::config::Config;
use takeboard::db;
use takeboard::db::users::{self, UserProfile};
use takeboard::notify::{LogNotifier, Notifier};
use takeboard::routes;
use takeboard::state::AppState;

pub struct TestApp {
    pub state: AppState,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let pool = db::create_pool(&tmp.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();

        let state = AppState {
            db: pool,
            config: Config::default(),
            classifier: Arc::new(Classifier::preloaded(Arc::new(LexiconModel::new()))),
            notifier: Arc::new(LogNotifier) as Arc<dyn Notifier>,
        };
        Self { state, _tmp: tmp }
    }

    pub fn router(&self) -> Router {
        routes::router().with_state(self.state.clone())
    }

    pub fn seed_user(&self, id: &str, name: &str, reviewer: bool) {
        users::upsert(
            &self.state.db,
            &UserProfile {
                id: id.to_string(),
                display_name: Some(name.to_string()),
                reviewer,
                push_token: None,
            },
        )
        .unwrap();
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(uid) = user {
            builder = builder.header("x-user-id", uid);
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn submit(&self, user: &str, text: &str) -> (StatusCode, Value) {
        self.request("POST", "/api/takes", Some(user), Some(json!({ "text": text })))
            .await
    }

    pub async fn score(&self, user: &str, take_id: &str, score: i64) -> (StatusCode, Value) {
        self.request(
            "POST",
            &format!("/api/takes/{take_id}/score"),
            Some(user),
            Some(json!({ "score": score })),
        )
        .await
    }
}

pub fn error_kind(body: &Value) -> &str {
    body["error"]["kind"].as_str().unwrap()
}
