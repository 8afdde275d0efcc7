pub mod feed;
pub mod presence;
pub mod review;
pub mod rewards;
pub mod settings;
pub mod takes;

use axum::Router;

use crate::state::AppState;

/// Every API route, merged. Paths are absolute so each module reads as a
/// complete table of its endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(takes::router())
        .merge(feed::router())
        .merge(review::router())
        .merge(presence::router())
        .merge(rewards::router())
        .merge(settings::router())
}
