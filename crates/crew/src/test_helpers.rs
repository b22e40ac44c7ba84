//! Shared test helpers for crew tests.

use crate::task::{CrewTask, TaskExecutor, TaskOutput};
use agentquest_core::error::{DispatchError, ProviderError};
use agentquest_core::message::{Message, MessageToolCall};
use agentquest_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// A provider whose only call fails.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            responses: Mutex::new(vec![Err(error)]),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        responses[count].clone()
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut response = make_text_response(thought);
    response.message.tool_calls = tool_calls;
    response
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{}", name),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

type Responder = dyn Fn(&CrewTask, &[TaskOutput]) -> Result<String, DispatchError> + Send + Sync;

/// One recorded `execute` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub task: String,
    pub agent: String,
    pub description: String,
    pub context: Vec<String>,
}

/// A task executor driven by a closure. Every call is recorded.
pub struct ScriptedExecutor {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CrewTask, &[TaskOutput]) -> Result<String, DispatchError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, task: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.task == task).collect()
    }
}

#[async_trait::async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn execute(&self, task: &CrewTask, context: &[TaskOutput]) -> Result<TaskOutput, DispatchError> {
        self.calls.lock().unwrap().push(RecordedCall {
            task: task.name.clone(),
            agent: task.persona.role.clone(),
            description: task.description.clone(),
            context: context.iter().map(|c| c.task.clone()).collect(),
        });
        let raw = (self.responder)(task, context)?;
        Ok(TaskOutput::text(task, raw))
    }
}
