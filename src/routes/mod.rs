pub mod health;
pub mod saved_posts;

pub use health::health_check;
pub use saved_posts::{check_saved_post, list_saved_posts, save_post, unsave_post};

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the API router for the given state
pub fn router(state: AppState) -> Router {
    let log_requests = state.config.log_requests;

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route(
            "/api/saved-posts/:user_id",
            get(list_saved_posts).post(save_post),
        )
        .route(
            "/api/saved-posts/:user_id/:post_id",
            get(check_saved_post).delete(unsave_post),
        )
        .with_state(state);

    if log_requests {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
