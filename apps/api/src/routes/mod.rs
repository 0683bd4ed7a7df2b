pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/v1/analyses",
            post(handlers::handle_analyze).get(handlers::handle_list_analyses),
        )
        .route(
            "/api/v1/analyses/parse-job",
            post(handlers::handle_parse_job),
        )
        .route("/api/v1/analyses/:id", get(handlers::handle_get_analysis))
        .with_state(state)
}
