//! HTTP API for driving a practice session
//!
//! - GET /health - Health check
//! - GET /session - Current session snapshot
//! - POST /session/capture/{start,stop,toggle} - Capture control
//! - POST /session/dialect - Select the dialect
//! - POST /session/free - Enter free speak
//! - POST /session/lessons - Return to lessons
//! - POST /session/restart - Restart the lesson run
//! - POST /score - Score a transcript without audio

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, ScoreResponse};
pub use routes::create_router;
pub use state::AppState;
