//! HTTP + WebSocket API for Stressline
//!
//! Endpoints:
//! - GET  /health     - Health check
//! - GET  /status     - Controller snapshot
//! - GET  /assessment - Latest assessment
//! - POST /frame      - Submit one frame of landmarks
//! - POST /command    - Apply a control command
//! - POST /transcript - Supply the session transcript
//! - WS   /ws         - Live snapshots
//!
//! The controller is synchronous (audio join, blocking oracle call), so every
//! handler runs it on the blocking pool.

use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::core::{CommandOutcome, ControllerError, SessionController};
use crate::types::{AssessmentResult, Command, ControllerSnapshot, Frame, FrameOutput};

/// App state
pub struct AppState {
    pub controller: Arc<Mutex<SessionController>>,
    pub update_tx: broadcast::Sender<ControllerSnapshot>,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub state: String,
}

/// Frame response; `output` is absent when the frame had no face
#[derive(Debug, Serialize, Deserialize)]
pub struct FrameResponse {
    pub output: Option<FrameOutput>,
    pub state: String,
}

/// Command request
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: Command,
}

/// Transcript request
#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub transcript: String,
}

/// Error body for rejected commands
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub state: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Create the API router around a shared controller
pub fn create_router(controller: SessionController) -> Router {
    let (update_tx, _) = broadcast::channel(100);
    let state = Arc::new(AppState {
        controller: Arc::new(Mutex::new(controller)),
        update_tx,
    });

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/assessment", get(assessment))
        .route("/frame", post(submit_frame))
        .route("/command", post(apply_command))
        .route("/transcript", post(supply_transcript))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Run `f` against the controller on the blocking pool
async fn with_controller<T, F>(state: &AppState, f: F) -> Result<T, (StatusCode, Json<ErrorResponse>)>
where
    F: FnOnce(&mut SessionController) -> T + Send + 'static,
    T: Send + 'static,
{
    let controller = state.controller.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = controller.lock().map_err(|_| internal("controller lock poisoned"))?;
        Ok(f(&mut guard))
    })
    .await
    .map_err(|_| internal("controller task failed"))?
}

fn internal(msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: msg.to_string(),
            state: "UNKNOWN".to_string(),
        }),
    )
}

fn rejected(err: ControllerError, snapshot: &ControllerSnapshot) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: err.to_string(),
            state: snapshot.state.to_string(),
        }),
    )
}

/// Push a snapshot to WebSocket subscribers (none is fine)
fn publish(state: &AppState, snapshot: ControllerSnapshot) {
    let _ = state.update_tx.send(snapshot);
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let current = with_controller(&state, |c| c.state()).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        state: current.to_string(),
    }))
}

/// Controller snapshot
async fn status(State(state): State<Arc<AppState>>) -> ApiResult<ControllerSnapshot> {
    let snapshot = with_controller(&state, |c| c.snapshot()).await?;
    Ok(Json(snapshot))
}

/// Latest assessment ("Not assessed" before the first session)
async fn assessment(State(state): State<Arc<AppState>>) -> ApiResult<AssessmentResult> {
    let result = with_controller(&state, |c| c.assessment().clone()).await?;
    Ok(Json(result))
}

/// Submit one frame
async fn submit_frame(
    State(state): State<Arc<AppState>>,
    Json(frame): Json<Frame>,
) -> ApiResult<FrameResponse> {
    let (output, snapshot) = with_controller(&state, move |c| {
        let output = c.process_frame(&frame);
        (output, c.snapshot())
    })
    .await?;

    let current = snapshot.state.to_string();
    publish(&state, snapshot);
    Ok(Json(FrameResponse { output, state: current }))
}

/// Apply a command
async fn apply_command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> ApiResult<CommandOutcome> {
    let command = req.command;
    let (result, snapshot) = with_controller(&state, move |c| {
        let result = c.apply(command);
        (result, c.snapshot())
    })
    .await?;

    match result {
        Ok(outcome) => {
            info!(command = %command, "command applied via api");
            publish(&state, snapshot);
            Ok(Json(outcome))
        }
        Err(e) => Err(rejected(e, &snapshot)),
    }
}

/// Supply the transcript used by the next voice analysis
async fn supply_transcript(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscriptRequest>,
) -> ApiResult<ControllerSnapshot> {
    debug!(chars = req.transcript.len(), "transcript received");
    let snapshot = with_controller(&state, move |c| {
        c.supply_transcript(req.transcript);
        c.snapshot()
    })
    .await?;
    Ok(Json(snapshot))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.update_tx.subscribe();
    ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    })
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<ControllerSnapshot>) {
    loop {
        match rx.recv().await {
            Ok(update) => {
                let json = serde_json::to_string(&update).unwrap_or_default();
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "websocket subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Run the API server
pub async fn run_server(addr: &str, controller: SessionController) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(controller);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "stressline api listening");
    println!("Stressline API running on {}", addr);
    println!("  GET  /health      - Health check");
    println!("  GET  /status      - Controller snapshot");
    println!("  GET  /assessment  - Latest assessment");
    println!("  POST /frame       - Submit landmarks");
    println!("  POST /command     - Apply command");
    println!("  POST /transcript  - Supply transcript");
    println!("  WS   /ws          - Live updates");
    axum::serve(listener, router).await?;
    Ok(())
}
