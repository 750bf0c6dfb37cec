pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::transform::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route(
            "/api/v1/session",
            get(handlers::handle_session_status)
                .put(handlers::handle_initialize_session)
                .delete(handlers::handle_clear_session),
        )
        // Documents
        .route("/api/v1/documents/adapt", post(handlers::handle_adapt))
        .route(
            "/api/v1/documents/cover-letter",
            post(handlers::handle_cover_letter),
        )
        .route("/api/v1/documents/tailor", post(handlers::handle_tailor))
        .with_state(state)
}
