//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly (not OpenAI-compatible proxy).
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//!
//! The Messages API has no JSON response mode, so a JSON request is turned
//! into an instruction appended to the system prompt.

use async_trait::async_trait;
use agentquest_core::error::ProviderError;
use agentquest_core::message::{Message, MessageToolCall, Role};
use agentquest_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Extract system messages from the message list.
    /// Anthropic puts system prompt as a top-level field, not in messages.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut non_system: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                _ => non_system.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, non_system)
    }

    /// Convert messages to Anthropic API format with content blocks.
    fn to_api_messages(messages: &[&Message]) -> Vec<AnthropicMessage> {
        let mut result = Vec::new();

        for msg in messages {
            match msg.role {
                Role::User => {
                    result.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant if msg.tool_calls.is_empty() => {
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant => {
                    let mut blocks: Vec<ContentBlock> = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::Text {
                            text: msg.content.clone(),
                        });
                    }
                    for tc in &msg.tool_calls {
                        let input: serde_json::Value =
                            serde_json::from_str(&tc.arguments).unwrap_or_default();
                        blocks.push(ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input,
                        });
                    }
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
                Role::Tool => {
                    result.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Blocks(vec![ContentBlock::ToolResult {
                            tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                            content: msg.content.clone(),
                        }]),
                    });
                }
                Role::System => {} // handled separately
            }
        }

        result
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    }

    fn json_instruction(format: &ResponseFormat) -> Option<String> {
        match format {
            ResponseFormat::Text => None,
            ResponseFormat::Json { schema: None } => {
                Some("Respond with a single JSON object and nothing else.".into())
            }
            ResponseFormat::Json { schema: Some(schema) } => Some(format!(
                "Respond with a single JSON object and nothing else. It must match this JSON Schema:\n{schema}"
            )),
        }
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let (system, messages) = Self::extract_system(&request.messages);
        let system = match (system, Self::json_instruction(&request.response_format)) {
            (Some(sys), Some(json)) => Some(format!("{sys}\n\n{json}")),
            (sys, json) => sys.or(json),
        };

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&messages),
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": request.temperature,
        });

        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    fn response_to_provider_response(
        resp: AnthropicResponse,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for block in &resp.content {
            match block {
                ResponseContentBlock::Text { text } => {
                    if !text_content.is_empty() {
                        text_content.push('\n');
                    }
                    text_content.push_str(text);
                }
                ResponseContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(MessageToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        arguments: input.to_string(),
                    });
                }
            }
        }

        if resp.stop_reason.as_deref() == Some("max_tokens") {
            warn!(model = %resp.model, "Anthropic response truncated at max_tokens");
        }

        let mut message = Message::assistant(text_content);
        message.id = resp.id;
        message.tool_calls = tool_calls;

        let usage = Some(Usage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
            total_tokens: resp.usage.input_tokens + resp.usage.output_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: resp.model,
        })
    }
}

#[async_trait]
impl agentquest_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request);

        debug!(provider = "anthropic", model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Anthropic response: {e}"),
            })?;

        Self::response_to_provider_response(api_resp)
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: AnthropicUsage,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentquest_core::Provider;

    #[test]
    fn constructor() {
        let provider = AnthropicProvider::new("sk-ant-test");
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let provider = AnthropicProvider::new("sk-ant-test").with_base_url("http://proxy.local/");
        assert_eq!(provider.base_url, "http://proxy.local");
    }

    #[test]
    fn system_extraction() {
        let messages = vec![
            Message::system("You are the Quest Designer"),
            Message::user("Design quests"),
        ];
        let (system, rest) = AnthropicProvider::extract_system(&messages);
        assert_eq!(system.as_deref(), Some("You are the Quest Designer"));
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn message_conversion_with_tool_calls() {
        let mut msg = Message::assistant("Let me roll.");
        msg.tool_calls = vec![MessageToolCall {
            id: "toolu_1".into(),
            name: "roll_dice".into(),
            arguments: r#"{"notation":"1d20+2"}"#.into(),
        }];
        let result = Message::tool_result("toolu_1", "Rolled 1d20+2: [11] + 2 = 13");
        let api = AnthropicProvider::to_api_messages(&[&msg, &result]);

        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "assistant");
        match &api[0].content {
            AnthropicContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                assert!(matches!(&blocks[1], ContentBlock::ToolUse { name, .. } if name == "roll_dice"));
            }
            AnthropicContent::Text(_) => panic!("expected blocks"),
        }
        assert_eq!(api[1].role, "user");
        assert!(matches!(
            &api[1].content,
            AnthropicContent::Blocks(b) if matches!(&b[0], ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "toolu_1")
        ));
    }

    #[test]
    fn json_request_extends_system_prompt() {
        let mut req = ProviderRequest::new(
            "claude-sonnet-4",
            vec![Message::system("You are the Consistency Checker"), Message::user("Check")],
        );
        req.response_format = ResponseFormat::Json {
            schema: Some(serde_json::json!({"type": "object"})),
        };
        let body = AnthropicProvider::build_body(&req);
        let system = body["system"].as_str().unwrap();
        assert!(system.starts_with("You are the Consistency Checker"));
        assert!(system.contains("JSON Schema"));
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn text_request_has_no_json_instruction() {
        let req = ProviderRequest::new("claude-sonnet-4", vec![Message::user("Hi")]);
        let body = AnthropicProvider::build_body(&req);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn parse_tool_use_response() {
        let data = r#"{
            "id": "msg_1",
            "model": "claude-sonnet-4",
            "content": [
                {"type": "text", "text": "Rolling."},
                {"type": "tool_use", "id": "toolu_1", "name": "roll_dice", "input": {"notation": "2d6"}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 7},
            "stop_reason": "tool_use"
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(data).unwrap();
        let resp = AnthropicProvider::response_to_provider_response(parsed).unwrap();
        assert_eq!(resp.message.id, "msg_1");
        assert_eq!(resp.message.content, "Rolling.");
        assert_eq!(resp.message.tool_calls[0].arguments, r#"{"notation":"2d6"}"#);
        assert_eq!(resp.usage.unwrap().total_tokens, 19);
    }
}
