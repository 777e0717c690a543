//! Integration tests for the HTTP API
//!
//! Tests API endpoints against a controller with no oracle and silent audio

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use stressline::config::StressConfig;
use stressline::core::{create_router, SessionController, SilenceBackend, VoiceStressEstimator};
use stressline::types::{FaceLandmarks, Frame, Point, LANDMARK_COUNT};
use stressline::CALIBRATION_FRAMES;
use tower::ServiceExt;

fn create_test_router() -> Router {
    let config = StressConfig {
        session_secs: 30,
        ..StressConfig::default()
    };
    let audio = Box::new(SilenceBackend { sample_rate: 16_000 });
    create_router(SessionController::new(config, VoiceStressEstimator::disabled(), audio))
}

fn neutral_frame() -> Frame {
    let mut points = vec![Point::new(0.0, 0.0); LANDMARK_COUNT];
    points[21] = Point::new(100.0, 50.0);
    points[22] = Point::new(140.0, 50.0);
    for p in &mut points[48..68] {
        *p = Point::new(120.0, 160.0);
    }
    points[48] = Point::new(100.0, 160.0);
    points[54] = Point::new(140.0, 160.0);
    points[51] = Point::new(120.0, 150.0);
    points[57] = Point::new(120.0, 170.0);
    Frame::single(FaceLandmarks::new(points))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn calibrate(app: &Router) {
    let frame = serde_json::to_value(neutral_frame()).unwrap();
    for _ in 0..CALIBRATION_FRAMES {
        let (status, _) = send(app, "POST", "/frame", Some(frame.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["state"], "IDLE_UNCALIBRATED");
}

#[tokio::test]
async fn test_status_before_any_frame() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "IDLE_UNCALIBRATED");
    assert_eq!(json["calibration_frames"], 0);
    assert_eq!(json["calibration_required"], 20);
    assert_eq!(json["assessment"]["label"], "Not assessed");
}

#[tokio::test]
async fn test_empty_frame_returns_no_output() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/frame", Some(json!({ "faces": [] }))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["output"].is_null());
    assert_eq!(json["state"], "IDLE_UNCALIBRATED");
}

#[tokio::test]
async fn test_frames_calibrate_controller() {
    let app = create_test_router();
    let frame = serde_json::to_value(neutral_frame()).unwrap();

    let (_, first) = send(&app, "POST", "/frame", Some(frame.clone())).await;
    assert_eq!(first["state"], "CALIBRATING");
    assert_eq!(first["output"]["label"], "Calibrating...");
    assert_eq!(first["output"]["stress"], 0.5);

    for _ in 1..CALIBRATION_FRAMES {
        send(&app, "POST", "/frame", Some(frame.clone())).await;
    }
    let (_, json) = send(&app, "GET", "/status", None).await;
    assert_eq!(json["state"], "IDLE_MONITORING");
    assert_eq!(json["baseline"]["eye_gap"], 40.0);
}

#[tokio::test]
async fn test_start_session_requires_calibration() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/command", Some(json!({ "command": "start_session" }))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("calibration"));
    assert_eq!(json["state"], "IDLE_UNCALIBRATED");
}

#[tokio::test]
async fn test_session_round_trip() {
    let app = create_test_router();
    calibrate(&app).await;

    let (status, json) = send(&app, "POST", "/command", Some(json!({ "command": "start_session" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "started");
    assert_eq!(json["session_secs"], 30);

    let frame = serde_json::to_value(neutral_frame()).unwrap();
    let (_, json) = send(&app, "POST", "/frame", Some(frame)).await;
    assert_eq!(json["state"], "SESSION_ACTIVE");
    assert_eq!(json["output"]["reason"], "S002_SCORED_IN_SESSION");

    let (status, json) = send(&app, "POST", "/transcript", Some(json!({ "transcript": "fine, thanks" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "SESSION_ACTIVE");

    let (status, json) = send(&app, "POST", "/command", Some(json!({ "command": "end_session" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "ended");
    assert_eq!(json["assessment"]["has_spoken"], false);

    let (_, json) = send(&app, "GET", "/assessment", None).await;
    assert_eq!(json["voice_stress"], 0.0);
    assert!(json["label"].as_str().unwrap().ends_with("(facial expression only)"));
    assert_eq!(json["combined_stress"], json["facial_stress"]);

    let (status, _) = send(&app, "POST", "/command", Some(json!({ "command": "reset_results" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = send(&app, "GET", "/assessment", None).await;
    assert_eq!(json["label"], "Not assessed");
}

#[tokio::test]
async fn test_unknown_command_rejected() {
    let app = create_test_router();
    let (status, _) = send(&app, "POST", "/command", Some(json!({ "command": "self_destruct" }))).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_toggle_overlay() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/command", Some(json!({ "command": "toggle_overlay" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "overlay");
    assert_eq!(json["enabled"], false);
}
