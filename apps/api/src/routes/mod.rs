pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers as evaluation;
use crate::integrity::handlers as integrity;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Integrity API (live, per sample)
        .route(
            "/api/v1/interviews/:id/integrity",
            post(integrity::handle_integrity_update),
        )
        .route(
            "/api/v1/interviews/:id/integrity/finalize",
            post(integrity::handle_integrity_finalize),
        )
        // Evaluation API (post-interview)
        .route(
            "/api/v1/interviews/:id/evaluate",
            post(evaluation::handle_evaluate),
        )
        .route(
            "/api/v1/interviews/:id/evaluation",
            get(evaluation::handle_get_evaluation),
        )
        .with_state(state)
}
