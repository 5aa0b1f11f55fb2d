use super::handlers;
use super::state::AppState;
use crate::api::Endpoints;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let endpoints = Endpoints::default();

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route(&endpoints.start_interview, post(handlers::start_interview))
        .route(&endpoints.finalize_interview, post(handlers::end_interview))
        .route(&endpoints.interview_outline, get(handlers::interview_list))
        // Room credentials
        .route(
            &endpoints.connection_details,
            post(handlers::connection_details),
        )
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
