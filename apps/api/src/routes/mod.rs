pub mod analysis;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::editor::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API (proxied to the analysis service)
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .route("/api/v1/cover-letter", post(analysis::handle_cover_letter))
        // Editor API (stateless; the session travels in the body)
        .route("/api/v1/editor/toggle", post(handlers::handle_toggle))
        .route("/api/v1/editor/terms/add", post(handlers::handle_add_term))
        .route(
            "/api/v1/editor/terms/remove",
            post(handlers::handle_remove_term),
        )
        .route("/api/v1/editor/reset", post(handlers::handle_reset))
        .route("/api/v1/editor/export", post(handlers::handle_export))
        .with_state(state)
}
