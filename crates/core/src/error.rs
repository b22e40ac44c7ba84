//! Error types for the AgentQuest domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for AgentQuest operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Persistence errors ---
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    // --- Agent dispatch errors ---
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    // --- Gameplay ---
    #[error("Round failed: {0}")]
    Round(#[from] RoundError),

    // --- World generation ---
    #[error("World generation failed: {0}")]
    Generation(#[from] GenerationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures of the JSON state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No persisted state at {path}")]
    NotFound { path: PathBuf },

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not match the record schema.
    /// `field` is the JSON path of the offending value (`.` for the document root).
    #[error("Invalid {path}: field `{field}`: {reason}")]
    SchemaInvalid {
        path: PathBuf,
        field: String,
        reason: String,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A step could not be executed by the agent-execution capability.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("step '{step}' failed: {source}")]
    Provider {
        step: String,
        #[source]
        source: ProviderError,
    },

    #[error("step '{step}' is malformed: {reason}")]
    MalformedTask { step: String, reason: String },
}

impl DispatchError {
    /// Name of the step that failed.
    pub fn step(&self) -> &str {
        match self {
            Self::Provider { step, .. } | Self::MalformedTask { step, .. } => step,
        }
    }
}

/// A round aborted before its state was committed.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error("round {round}: history compaction failed: {source}")]
    Compaction {
        round: u32,
        #[source]
        source: DispatchError,
    },

    #[error("round {round}: {source}")]
    Dispatch {
        round: u32,
        #[source]
        source: DispatchError,
    },

    #[error("round {round}: {source}")]
    Store {
        round: u32,
        #[source]
        source: StoreError,
    },
}

impl RoundError {
    /// The round number that was being played.
    pub fn round(&self) -> u32 {
        match self {
            Self::Compaction { round, .. } | Self::Dispatch { round, .. } | Self::Store { round, .. } => {
                *round
            }
        }
    }
}

/// Why one world generation iteration did not produce an approved world.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("output was not parseable: {0}")]
    Parse(String),

    #[error("output did not match the world schema at `{field}`: {reason}")]
    Schema { field: String, reason: String },

    #[error("consistency check rejected the world: {}", .issues.as_deref().unwrap_or("no issues given"))]
    Rejected { issues: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    /// 1-based
    pub iteration: u32,
    pub failure: GenerationFailure,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("iteration {iteration}: {source}")]
    Dispatch {
        iteration: u32,
        #[source]
        source: DispatchError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every iteration failed; nothing was persisted.
    #[error("no approved world after {} attempts; last failure: {last_failure}", .attempts.len())]
    Exhausted {
        attempts: Vec<GenerationAttempt>,
        last_failure: GenerationFailure,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn schema_error_names_field() {
        let err = StoreError::SchemaInvalid {
            path: PathBuf::from("world_state.json"),
            field: "main_quest.title".into(),
            reason: "missing field `title`".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("main_quest.title"));
        assert!(msg.contains("world_state.json"));
    }

    #[test]
    fn dispatch_error_reports_step() {
        let err = DispatchError::Provider {
            step: "describe_scene".into(),
            source: ProviderError::Network("connection refused".into()),
        };
        assert_eq!(err.step(), "describe_scene");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn round_error_carries_round() {
        let err = RoundError::Compaction {
            round: 12,
            source: DispatchError::MalformedTask {
                step: "summarize_history".into(),
                reason: "empty".into(),
            },
        };
        assert_eq!(err.round(), 12);
        assert!(err.to_string().starts_with("round 12: history compaction failed"));
    }

    #[test]
    fn exhausted_generation_names_last_failure() {
        let failure = GenerationFailure::Rejected {
            issues: Some("Stormkeep links to a missing road".into()),
        };
        let err = GenerationError::Exhausted {
            attempts: vec![
                GenerationAttempt { iteration: 1, failure: GenerationFailure::Parse("no JSON".into()) },
                GenerationAttempt { iteration: 2, failure: failure.clone() },
            ],
            last_failure: failure,
        };
        let msg = err.to_string();
        assert!(msg.contains("after 2 attempts"));
        assert!(msg.contains("missing road"));
    }
}
