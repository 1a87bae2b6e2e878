use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session state
        .route("/session", get(handlers::get_session))
        // Capture control
        .route("/session/capture/start", post(handlers::start_capture))
        .route("/session/capture/stop", post(handlers::stop_capture))
        .route("/session/capture/toggle", post(handlers::toggle_capture))
        // Practice setup
        .route("/session/dialect", post(handlers::set_dialect))
        .route("/session/free", post(handlers::free_speak))
        .route("/session/lessons", post(handlers::back_to_lessons))
        .route("/session/restart", post(handlers::restart))
        // Offline scoring
        .route("/score", post(handlers::score))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
