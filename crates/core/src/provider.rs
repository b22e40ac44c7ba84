//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send a message exchange to an LLM and get a
//! complete response back. Implementations: OpenAI-compatible, Anthropic.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4", "gpt-4o")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Requested output format
    #[serde(default)]
    pub response_format: ResponseFormat,
}

fn default_temperature() -> f32 {
    0.7
}

impl ProviderRequest {
    /// A request with default temperature, no tools and free-text output.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
            response_format: ResponseFormat::Text,
        }
    }
}

/// The output format a caller asks the model for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    /// A single JSON object, optionally described by a JSON Schema.
    Json {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<serde_json::Value>,
    },
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The task executor calls
/// `complete()` without knowing which provider is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter", "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults() {
        let req = ProviderRequest::new("gpt-4o", vec![Message::user("hi")]);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.response_format, ResponseFormat::Text);
        assert!(req.tools.is_empty());
    }

    #[test]
    fn response_format_serialization() {
        let fmt = ResponseFormat::Json { schema: None };
        let json = serde_json::to_string(&fmt).unwrap();
        assert_eq!(json, r#"{"type":"json"}"#);

        let parsed: ResponseFormat = serde_json::from_str(r#"{"type":"text"}"#).unwrap();
        assert_eq!(parsed, ResponseFormat::Text);
    }
}
