//! Game API.
//!
//! Endpoints:
//!
//! - `GET  /api/status`     — Which artifacts exist, whether a session is open
//! - `POST /api/generate`   — Run the world generation loop
//! - `POST /api/play/start` — Open (or resume) a game session
//! - `POST /api/play/step`  — Play one round, streamed as SSE round events
//! - `GET  /api/state`      — Persisted world, game state and transcript

use crate::SharedState;
use agentquest_config::roster::{load_roster, parse_roster_toml};
use agentquest_core::error::{GenerationError, StoreError};
use agentquest_core::game::GameState;
use agentquest_core::world::WorldState;
use agentquest_crew::session::{GAME_STATE_FILE, TRANSCRIPT_FILE};
use agentquest_crew::generation::world_exists;
use agentquest_crew::{GameSession, SessionOptions, WorldGenerator, spawn_round, store};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, Sse},
    routing::{get, post},
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/play/start", post(play_start_handler))
        .route("/api/play/step", post(play_step_handler))
        .route("/api/state", get(state_handler))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// A persisted document, or `None` when the file does not exist yet.
async fn load_optional<T: DeserializeOwned + JsonSchema>(path: &Path) -> Result<Option<T>, ApiError> {
    match store::load(path).await {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

// ── Status ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub world_generated: bool,
    pub game_in_progress: bool,
    pub session_active: bool,
}

async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        world_generated: world_exists(&state.world_dir()),
        game_in_progress: state.session_dir().join(GAME_STATE_FILE).is_file(),
        session_active: state.session.lock().await.is_some(),
    })
}

// ── Generation ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub seed: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub world_state: WorldState,
}

async fn generate_handler(
    State(state): State<SharedState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let seed = payload.seed.trim();
    if seed.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "seed must not be empty"));
    }

    let _running = state
        .generating
        .try_lock()
        .map_err(|_| api_error(StatusCode::CONFLICT, "world generation is already running"))?;

    info!(seed_len = seed.len(), "api/generate request");

    let generator = WorldGenerator::new(state.executor.clone(), state.world_dir())
        .with_max_iterations(state.config.generation.max_iterations);

    match generator.run(seed).await {
        Ok(world_state) => Ok(Json(GenerateResponse {
            message: "World generated successfully".into(),
            world_state,
        })),
        Err(e) => {
            error!(error = %e, "World generation failed");
            let status = match e {
                GenerationError::Dispatch { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err(api_error(status, e.to_string()))
        }
    }
}

// ── Play ──────────────────────────────────────────────────────────────────

fn default_resume() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PlayStartRequest {
    /// Inline roster; the configured players file is used when absent
    #[serde(default)]
    pub players_toml: Option<String>,
    #[serde(default = "default_resume")]
    pub resume: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayStartResponse {
    pub message: String,
    pub game_state: GameState,
}

async fn play_start_handler(
    State(state): State<SharedState>,
    Json(payload): Json<PlayStartRequest>,
) -> Result<Json<PlayStartResponse>, ApiError> {
    let world: WorldState = load_optional(&state.world_path())
        .await?
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No world generated yet. Run generation first."))?;

    let players = match &payload.players_toml {
        Some(text) => parse_roster_toml(text),
        None => load_roster(&state.config.session.players_file),
    }
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut slot = state.session.lock().await;
    if let Some(existing) = slot.as_ref() {
        if existing.try_lock().is_err() {
            return Err(api_error(StatusCode::CONFLICT, "a round is in progress"));
        }
    }

    let session_config = &state.config.session;
    let options = SessionOptions {
        resume: payload.resume,
        starting_hp: session_config.starting_hp,
        starting_inventory: session_config.starting_inventory.clone(),
        history_threshold: session_config.history_threshold,
        keep_recent: session_config.keep_recent,
        world_path: Some(state.world_path()),
    };

    let session = GameSession::open(world, players, state.session_dir(), state.executor.clone(), options)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let game_state = session.game_state().clone();
    *slot = Some(Arc::new(Mutex::new(session)));

    info!(round = game_state.round_number, resume = payload.resume, "api/play/start session opened");
    Ok(Json(PlayStartResponse {
        message: "Game session started".into(),
        game_state,
    }))
}

/// `POST /api/play/step`: play one round, streaming its events.
async fn play_step_handler(
    State(state): State<SharedState>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let handle = state
        .session
        .lock()
        .await
        .clone()
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No active session. Start a game first."))?;

    let guard = handle
        .try_lock_owned()
        .map_err(|_| api_error(StatusCode::CONFLICT, "a round is already in progress"))?;

    info!("api/play/step SSE request");
    let rx = spawn_round(guard);

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let event_type = event.event_type().to_string();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream))
}

// ── State ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct StateResponse {
    pub world_state: Option<WorldState>,
    pub game_state: Option<GameState>,
    pub transcript: Option<String>,
}

async fn state_handler(State(state): State<SharedState>) -> Result<Json<StateResponse>, ApiError> {
    let world_state = load_optional(&state.world_path()).await?;
    let game_state = load_optional(&state.session_dir().join(GAME_STATE_FILE)).await?;

    let transcript = match tokio::fs::read_to_string(state.session_dir().join(TRANSCRIPT_FILE)).await {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    };

    Ok(Json(StateResponse {
        world_state,
        game_state,
        transcript,
    }))
}
