//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, Groq and any
//! endpoint exposing `/v1/chat/completions`.
//!
//! Supports:
//! - Chat completions
//! - Tool use / function calling
//! - JSON output (`json_object`, or `json_schema` when a schema is supplied)

use async_trait::async_trait;
use agentquest_core::error::ProviderError;
use agentquest_core::message::{Message, MessageToolCall, Role};
use agentquest_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Build the `/chat/completions` request body.
    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        match &request.response_format {
            ResponseFormat::Text => {}
            ResponseFormat::Json { schema: None } => {
                body["response_format"] = serde_json::json!({ "type": "json_object" });
            }
            ResponseFormat::Json { schema: Some(schema) } => {
                body["response_format"] = serde_json::json!({
                    "type": "json_schema",
                    "json_schema": { "name": "output", "schema": schema },
                });
            }
        }

        body
    }
}

#[async_trait]
impl agentquest_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::into_provider_response(api_response)
    }
}

impl OpenAiCompatProvider {
    fn into_provider_response(
        api_response: ApiResponse,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let mut message = Message::assistant(choice.message.content.unwrap_or_default());
        message.tool_calls = tool_calls;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentquest_core::Provider;

    #[test]
    fn openrouter_constructor() {
        let provider = OpenAiCompatProvider::openrouter("sk-test");
        assert_eq!(provider.name(), "openrouter");
        assert!(provider.base_url().contains("openrouter.ai"));
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url().contains("localhost:11434"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let provider = OpenAiCompatProvider::new("custom", "http://localhost:9000/v1/", "k");
        assert_eq!(provider.base_url(), "http://localhost:9000/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are the Dungeon Master"), Message::user("Describe the scene")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn message_conversion_with_tool_calls() {
        let mut msg = Message::assistant("");
        msg.tool_calls = vec![MessageToolCall {
            id: "call_1".into(),
            name: "roll_dice".into(),
            arguments: r#"{"notation":"1d20"}"#.into(),
        }];
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg]);
        let tc = api_msgs[0].tool_calls.as_ref().unwrap();
        assert_eq!(tc.len(), 1);
        assert_eq!(tc[0].function.name, "roll_dice");
    }

    #[test]
    fn message_conversion_tool_response() {
        let msg = Message::tool_result("call_1", "Rolled 1d20: [14] = 14");
        let api_msgs = OpenAiCompatProvider::to_api_messages(&[msg]);
        assert_eq!(api_msgs[0].role, "tool");
        assert_eq!(api_msgs[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn tool_definition_conversion() {
        let tools = vec![ToolDefinition {
            name: "roll_dice".into(),
            description: "Roll dice".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiCompatProvider::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].function.name, "roll_dice");
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn body_for_plain_text_request() {
        let mut req = ProviderRequest::new("gpt-4o", vec![Message::user("hi")]);
        req.max_tokens = Some(256);
        let body = OpenAiCompatProvider::build_body(&req);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 256);
        assert!(body.get("response_format").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn body_requests_json_object() {
        let mut req = ProviderRequest::new("gpt-4o", vec![Message::user("hi")]);
        req.response_format = ResponseFormat::Json { schema: None };
        let body = OpenAiCompatProvider::build_body(&req);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn body_requests_json_schema() {
        let mut req = ProviderRequest::new("gpt-4o", vec![Message::user("hi")]);
        req.response_format = ResponseFormat::Json {
            schema: Some(serde_json::json!({"type": "object"})),
        };
        let body = OpenAiCompatProvider::build_body(&req);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn parse_completion_with_tool_call() {
        let data = r#"{
            "model": "gpt-4o",
            "choices": [{"message": {"role": "assistant", "content": null,
                "tool_calls": [{"id": "call_9", "type": "function",
                    "function": {"name": "roll_dice", "arguments": "{\"notation\":\"2d6\"}"}}]}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let resp = OpenAiCompatProvider::into_provider_response(parsed).unwrap();
        assert_eq!(resp.message.content, "");
        assert_eq!(resp.message.tool_calls[0].name, "roll_dice");
        assert_eq!(resp.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn empty_choices_is_api_error() {
        let parsed: ApiResponse = serde_json::from_str(r#"{"model":"m","choices":[]}"#).unwrap();
        let err = OpenAiCompatProvider::into_provider_response(parsed).unwrap_err();
        assert!(err.to_string().contains("No choices"));
    }
}
