use super::state::AppState;
use crate::error::PracticeError;
use crate::scoring::{Dialect, EvaluationVerdict};
use crate::session::{parse_expected, SessionSnapshot, Transition};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Phrase list given either as comma-separated text or as a JSON array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Phrases {
    Text(String),
    List(Vec<String>),
}

impl Phrases {
    fn into_vec(self) -> Vec<String> {
        match self {
            Phrases::Text(text) => parse_expected(&text),
            Phrases::List(list) => parse_expected(&list.join(",")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetDialectRequest {
    pub dialect: String,
}

#[derive(Debug, Deserialize)]
pub struct FreeSpeakRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    pub expected: Phrases,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub text: String,
    /// Defaults to central
    #[serde(default)]
    pub dialect: Option<String>,
    pub expected: Phrases,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub dialect: Dialect,
    pub normalized: String,
    pub verdict: EvaluationVerdict,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub status: String,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Map a session reply onto HTTP: applied 200, rejected 409, device 503
fn transition_response(state: &AppState, result: Result<Transition, PracticeError>) -> Response {
    match result {
        Ok(Transition::Applied) => (
            StatusCode::OK,
            Json(TransitionResponse {
                status: "applied".to_string(),
                session: state.session.snapshot(),
            }),
        )
            .into_response(),
        Ok(Transition::Rejected(reason)) => {
            info!("Session request rejected: {}", reason);
            error_response(StatusCode::CONFLICT, reason)
        }
        Err(e @ (PracticeError::DeviceUnavailable(_) | PracticeError::SessionClosed)) => {
            warn!("Session request failed: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Err(e) => {
            error!("Session request failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn parse_dialect(raw: Option<&str>) -> Result<Dialect, Response> {
    match raw {
        None => Ok(Dialect::default()),
        Some(raw) => raw
            .parse()
            .map_err(|e: anyhow::Error| error_response(StatusCode::BAD_REQUEST, e.to_string())),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.snapshot()))
}

/// POST /session/capture/start
pub async fn start_capture(State(state): State<AppState>) -> Response {
    let result = state.session.start_capture().await;
    transition_response(&state, result)
}

/// POST /session/capture/stop
pub async fn stop_capture(State(state): State<AppState>) -> Response {
    let result = state.session.stop_capture().await;
    transition_response(&state, result)
}

/// POST /session/capture/toggle
pub async fn toggle_capture(State(state): State<AppState>) -> Response {
    let result = state.session.toggle_capture().await;
    transition_response(&state, result)
}

/// POST /session/dialect
pub async fn set_dialect(
    State(state): State<AppState>,
    Json(req): Json<SetDialectRequest>,
) -> Response {
    let dialect = match parse_dialect(Some(&req.dialect)) {
        Ok(dialect) => dialect,
        Err(response) => return response,
    };

    let result = state.session.set_dialect(dialect).await;
    transition_response(&state, result)
}

/// POST /session/free
/// Enter free speak with ad-hoc expected phrases
pub async fn free_speak(
    State(state): State<AppState>,
    Json(req): Json<FreeSpeakRequest>,
) -> Response {
    let prompt = req.prompt.unwrap_or_else(|| "พูดอะไรก็ได้".to_string());
    let result = state.session.free_speak(prompt, req.expected.into_vec()).await;
    transition_response(&state, result)
}

/// POST /session/lessons
pub async fn back_to_lessons(State(state): State<AppState>) -> Response {
    let result = state.session.back_to_lessons().await;
    transition_response(&state, result)
}

/// POST /session/restart
pub async fn restart(State(state): State<AppState>) -> Response {
    let result = state.session.restart().await;
    transition_response(&state, result)
}

/// POST /score
/// Normalize and score a transcript without touching the session
pub async fn score(State(state): State<AppState>, Json(req): Json<ScoreRequest>) -> Response {
    let dialect = match parse_dialect(req.dialect.as_deref()) {
        Ok(dialect) => dialect,
        Err(response) => return response,
    };

    let text: String = req.text.chars().filter(|c| !c.is_whitespace()).collect();
    let expected = req.expected.into_vec();

    let normalized = state.evaluator.normalize(&text, dialect);
    let verdict = state.evaluator.evaluate(&text, dialect, &expected);

    (
        StatusCode::OK,
        Json(ScoreResponse {
            dialect,
            normalized,
            verdict,
        }),
    )
        .into_response()
}
