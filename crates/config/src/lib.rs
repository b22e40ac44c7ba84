//! Configuration loading, validation, and management for AgentQuest.
//!
//! Loads configuration from `~/.agentquest/config.toml` with environment
//! variable overrides. Validates all settings at startup.

pub mod roster;

pub use roster::load_roster;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentquest/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// World generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Gameplay session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("generation", &self.generation)
            .field("session", &self.session)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Attempts before world generation gives up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Where `world_state.json` is written
    #[serde(default = "default_generation_output")]
    pub output_dir: PathBuf,
}

fn default_max_iterations() -> u32 {
    3
}
fn default_generation_output() -> PathBuf {
    PathBuf::from("output")
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            output_dir: default_generation_output(),
        }
    }
}

impl GenerationConfig {
    pub fn world_path(&self) -> PathBuf {
        self.output_dir.join("world_state.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Compaction fires once history grows past this many entries
    #[serde(default = "default_history_threshold")]
    pub history_threshold: usize,

    /// Entries kept verbatim after compaction
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,

    #[serde(default = "default_starting_hp")]
    pub starting_hp: i32,

    #[serde(default = "default_starting_inventory")]
    pub starting_inventory: Vec<String>,

    /// Where `game_state.json` and `transcript.md` live
    #[serde(default = "default_session_output")]
    pub output_dir: PathBuf,

    /// Roster used when a caller does not supply one
    #[serde(default = "default_players_file")]
    pub players_file: PathBuf,

    /// Upper bound on tool-call round trips within one agent step
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

fn default_history_threshold() -> usize {
    10
}
fn default_keep_recent() -> usize {
    3
}
fn default_starting_hp() -> i32 {
    10
}
fn default_starting_inventory() -> Vec<String> {
    vec!["Basic Weapon".into(), "Rations".into()]
}
fn default_session_output() -> PathBuf {
    PathBuf::from("output/session")
}
fn default_players_file() -> PathBuf {
    PathBuf::from("players.toml")
}
fn default_max_tool_iterations() -> usize {
    8
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_threshold: default_history_threshold(),
            keep_recent: default_keep_recent(),
            starting_hp: default_starting_hp(),
            starting_inventory: default_starting_inventory(),
            output_dir: default_session_output(),
            players_file: default_players_file(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS. `["*"]` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".into(), "http://127.0.0.1:5173".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentquest/config.toml).
    ///
    /// Also checks environment variables:
    /// - `AGENTQUEST_API_KEY` (highest priority), `OPENROUTER_API_KEY`,
    ///   `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`
    /// - `AGENTQUEST_PROVIDER`
    /// - `AGENTQUEST_MODEL`, then `MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = ["AGENTQUEST_API_KEY", "OPENROUTER_API_KEY", "OPENAI_API_KEY", "ANTHROPIC_API_KEY"]
                .iter()
                .find_map(|key| lookup(key));
        }

        if let Some(provider) = lookup("AGENTQUEST_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("AGENTQUEST_MODEL").or_else(|| lookup("MODEL")) {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentquest")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.generation.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_iterations must be at least 1".into(),
            ));
        }

        if self.session.keep_recent >= self.session.history_threshold {
            return Err(ConfigError::ValidationError(
                "session.keep_recent must be smaller than session.history_threshold".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            generation: GenerationConfig::default(),
            session: SessionConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
