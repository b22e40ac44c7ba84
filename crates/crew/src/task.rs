//! Tasks and the agent-execution capability.
//!
//! A `CrewTask` is one step: what to do, what to hand back, who does it, and
//! which earlier steps it reads. A `TaskExecutor` turns a task plus the
//! outputs of its dependencies into a `TaskOutput`. `ProviderExecutor` is the
//! LLM-backed executor; tests substitute scripted ones.

use crate::persona::Persona;
use agentquest_core::error::DispatchError;
use agentquest_core::message::Message;
use agentquest_core::provider::{Provider, ProviderRequest, ResponseFormat};
use agentquest_core::tool::ToolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CrewTask {
    /// Unique within a crew
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub persona: Persona,
    /// Names of the tasks whose outputs this task reads
    pub context: Vec<String>,
    /// When set, the executor asks for a JSON value of this shape
    pub output_schema: Option<serde_json::Value>,
}

impl CrewTask {
    pub fn new(
        name: impl Into<String>,
        persona: Persona,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            persona,
            context: Vec::new(),
            output_schema: None,
        }
    }

    pub fn with_context<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

/// What one task produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task: String,
    /// Role of the persona that produced it
    pub agent: String,
    pub raw: String,
    /// Set when the task asked for structured output and got a JSON object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
}

impl TaskOutput {
    pub fn text(task: &CrewTask, raw: impl Into<String>) -> Self {
        Self {
            task: task.name.clone(),
            agent: task.persona.role.clone(),
            raw: raw.into(),
            structured: None,
        }
    }
}

/// The agent-execution capability.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        task: &CrewTask,
        context: &[TaskOutput],
    ) -> std::result::Result<TaskOutput, DispatchError>;
}

/// Render the user message for a task: the work, the upstream outputs and
/// the expected output.
pub fn render_task_prompt(task: &CrewTask, context: &[TaskOutput]) -> String {
    let mut prompt = task.description.clone();

    if !context.is_empty() {
        prompt.push_str("\n\n# Context from earlier steps");
        for output in context {
            prompt.push_str(&format!("\n\n## {} ({})\n{}", output.task, output.agent, output.raw));
        }
    }

    prompt.push_str("\n\n# Expected output\n");
    prompt.push_str(&task.expected_output);
    prompt
}

/// Executes tasks against an LLM `Provider`, running the persona's tools
/// until the model answers in text.
pub struct ProviderExecutor {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_tool_iterations: usize,
}

impl ProviderExecutor {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_tool_iterations: 8,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of tool-call round trips per task.
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    fn request(&self, task: &CrewTask, messages: Vec<Message>, offer_tools: bool) -> ProviderRequest {
        let mut request = ProviderRequest::new(&self.model, messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        if offer_tools {
            request.tools = task.persona.tools.definitions();
        }
        if let Some(schema) = &task.output_schema {
            request.response_format = ResponseFormat::Json {
                schema: Some(schema.clone()),
            };
        }
        request
    }

    async fn call(&self, task: &CrewTask, request: ProviderRequest) -> Result<Message, DispatchError> {
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|source| DispatchError::Provider {
                step: task.name.clone(),
                source,
            })?;
        Ok(response.message)
    }
}

#[async_trait]
impl TaskExecutor for ProviderExecutor {
    async fn execute(
        &self,
        task: &CrewTask,
        context: &[TaskOutput],
    ) -> std::result::Result<TaskOutput, DispatchError> {
        if task.description.trim().is_empty() {
            return Err(DispatchError::MalformedTask {
                step: task.name.clone(),
                reason: "task has no description".into(),
            });
        }

        let mut messages = vec![
            Message::system(task.persona.system_prompt()),
            Message::user(render_task_prompt(task, context)),
        ];
        let has_tools = !task.persona.tools.is_empty();
        let mut iteration = 0;

        let final_text = loop {
            iteration += 1;

            let offer_tools = has_tools && iteration <= self.max_tool_iterations;
            if has_tools && !offer_tools {
                warn!(
                    step = %task.name,
                    iterations = iteration - 1,
                    "Max tool iterations reached, asking for a final answer"
                );
            }

            debug!(step = %task.name, iteration, "Task loop iteration");
            let reply = self.call(task, self.request(task, messages.clone(), offer_tools)).await?;

            if reply.tool_calls.is_empty() || !offer_tools {
                break reply.content;
            }

            let tool_calls = reply.tool_calls.clone();
            messages.push(reply);

            for tc in &tool_calls {
                let arguments = match serde_json::from_str(&tc.arguments) {
                    Ok(arguments) => arguments,
                    Err(e) => {
                        warn!(step = %task.name, tool = %tc.name, error = %e, "Malformed tool arguments");
                        messages.push(Message::tool_result(
                            &tc.id,
                            format!("Error: arguments for {} are not valid JSON: {e}", tc.name),
                        ));
                        continue;
                    }
                };
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments,
                };

                // Failures go back to the model so it can recover.
                let content = match task.persona.tools.execute(&call).await {
                    Ok(result) => result.output,
                    Err(e) => {
                        warn!(step = %task.name, tool = %tc.name, error = %e, "Tool execution failed");
                        format!("Error: {e}")
                    }
                };
                messages.push(Message::tool_result(&tc.id, content));
            }
        };

        let structured = task
            .output_schema
            .as_ref()
            .and_then(|_| serde_json::from_str::<serde_json::Value>(final_text.trim()).ok())
            .filter(|v| v.is_object());

        info!(
            step = %task.name,
            agent = %task.persona.role,
            chars = final_text.len(),
            structured = structured.is_some(),
            "Task completed"
        );

        Ok(TaskOutput {
            task: task.name.clone(),
            agent: task.persona.role.clone(),
            raw: final_text,
            structured,
        })
    }
}
