// Integration tests for the control API

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dialect_coach::scoring::Evaluator;
use dialect_coach::session::{SessionLedger, SessionRunner};
use dialect_coach::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use support::*;
use tempfile::TempDir;
use tower::ServiceExt;

fn app(backend: ScriptedBackend, dir: &TempDir) -> Router {
    let oracle = Arc::new(ScriptedOracle::saying(&["อร่อย"]));
    let session = session_with(backend, oracle, cards(&["อร่อย", "สวัสดี"]), dir.path());
    let (runner, handle) = SessionRunner::new(session, SessionLedger::default(), Duration::from_millis(16));
    let _runner = runner.spawn();

    create_router(AppState::new(handle, Arc::new(Evaluator::default())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_snapshot() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let (status, body) = send(&app, "GET", "/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "idle");
    assert_eq!(body["mode"]["kind"], "lesson");
    assert_eq!(body["dialect"], "central");
    assert_eq!(body["total_cards"], 2);
    assert_eq!(body["hearts"], 3);
}

#[tokio::test]
async fn test_capture_start_and_double_start() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let (status, body) = send(&app, "POST", "/session/capture/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "applied");
    assert_eq!(body["session"]["phase"], "recording");

    let (status, body) = send(&app, "POST", "/session/capture/start", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "session is not idle");
}

#[tokio::test]
async fn test_stop_when_idle_conflicts() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let (status, _) = send(&app, "POST", "/session/capture/stop", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unavailable_device_is_503() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::unavailable(), &dir);

    let (status, body) = send(&app, "POST", "/session/capture/toggle", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("audio device unavailable"));

    let (_, body) = send(&app, "GET", "/session", None).await;
    assert_eq!(body["phase"], "idle");
}

#[tokio::test]
async fn test_set_dialect() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let (status, body) = send(&app, "POST", "/session/dialect", Some(json!({"dialect": "Northern"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["dialect"], "northern");

    let (status, _) = send(&app, "POST", "/session/dialect", Some(json!({"dialect": "klingon"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_free_speak_and_back() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let (status, body) = send(
        &app,
        "POST",
        "/session/free",
        Some(json!({"prompt": "ลองพูด", "expected": "แซบ, แซบหลาย,"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["mode"]["kind"], "free");
    assert_eq!(body["session"]["targets"], json!(["แซบ", "แซบหลาย"]));

    let (status, body) = send(&app, "POST", "/session/lessons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["mode"]["kind"], "lesson");

    let (status, _) = send(&app, "POST", "/session/lessons", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_restart_while_recording_conflicts() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    send(&app, "POST", "/session/capture/start", None).await;
    let (status, _) = send(&app, "POST", "/session/restart", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_offline_score() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let (status, body) = send(
        &app,
        "POST",
        "/score",
        Some(json!({"text": "กิ๋น ข้าว", "dialect": "northern", "expected": ["กินข้าว"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["normalized"], "กินข้าว");
    assert_eq!(body["verdict"]["tier"], "ok");
    assert_eq!(body["verdict"]["score"], 100.0);
    assert_eq!(body["verdict"]["matched_phrase"], "กินข้าว");
}

#[tokio::test]
async fn test_offline_score_defaults_to_central() {
    let dir = TempDir::new().unwrap();
    let app = app(ScriptedBackend::silent(), &dir);

    let (status, body) = send(&app, "POST", "/score", Some(json!({"text": "", "expected": "อร่อย"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dialect"], "central");
    assert_eq!(body["verdict"]["tier"], "bad");
}
