//! HTTP API gateway for AgentQuest.
//!
//! Exposes world generation, session start, round stepping (as an SSE
//! stream of round events) and read access to the persisted artifacts.
//!
//! Built on Axum. The active game session lives in an explicit slot in the
//! shared state; there is no process-wide session handle.

pub mod api;

use agentquest_config::AppConfig;
use agentquest_core::error::Error;
use agentquest_crew::{GameSession, ProviderExecutor, TaskExecutor};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// A running session, locked for the duration of a round.
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub executor: Arc<dyn TaskExecutor>,
    /// Held while a world is being generated
    pub generating: Mutex<()>,
    pub session: Mutex<Option<SessionHandle>>,
}

impl GatewayState {
    pub fn new(config: AppConfig, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            config,
            executor,
            generating: Mutex::new(()),
            session: Mutex::new(None),
        }
    }

    pub fn world_dir(&self) -> PathBuf {
        self.config.generation.output_dir.clone()
    }

    pub fn world_path(&self) -> PathBuf {
        self.config.generation.world_path()
    }

    pub fn session_dir(&self) -> PathBuf {
        self.config.session.output_dir.clone()
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the task executor the configured provider backs. Local providers
/// (`ollama`) need no API key.
pub fn executor_from_config(config: &AppConfig) -> agentquest_core::Result<Arc<dyn TaskExecutor>> {
    if !config.has_api_key() && config.default_provider != "ollama" {
        return Err(Error::Config {
            message: format!(
                "no API key for provider '{}'; set AGENTQUEST_API_KEY or run `agentquest onboard`",
                config.default_provider
            ),
        });
    }

    let router = agentquest_providers::build_from_config(config);
    let provider = router.default_provider().ok_or_else(|| Error::Config {
        message: format!(
            "provider '{}' is not configured; set an API key",
            config.default_provider
        ),
    })?;

    Ok(Arc::new(
        ProviderExecutor::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_tool_iterations(config.session.max_tool_iterations),
    ))
}

/// Build the router with all gateway routes.
///
/// Layers applied:
/// - CORS restricted to the configured origins
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .gateway
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api::api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let executor = executor_from_config(&config)?;
    let app = build_router(Arc::new(GatewayState::new(config, executor)));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
