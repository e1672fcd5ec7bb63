//! OpenAI tool-calling chat model

use super::client::OpenAIClient;
use super::types::{
    CompletionRequest, CompletionResponse, FunctionCall, FunctionDefinition, Message,
    ToolDefinition, WireToolCall,
};
use crate::providers::invalid_response;
use crate::{ChatCompletion, ChatModel, ChatRequest, TokenUsage, ToolSpec};
use async_trait::async_trait;
use redmine_core::{AssistantResult, ChatMessage, Role, ToolArguments, ToolCall};
use secrecy::SecretString;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_MAX_TOKENS: i32 = 1000;

/// OpenAI chat model with deterministic sampling.
pub struct OpenAIChatModel {
    client: OpenAIClient,
    model: String,
    max_tokens: i32,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a new OpenAI chat model.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `model` - Model name (e.g., "gpt-4.1")
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self::with_client(OpenAIClient::new(api_key, 60), model)
    }

    pub fn with_client(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
        }
    }

    /// Create model with default gpt-4.1.
    pub fn with_default_model(api_key: SecretString) -> Self {
        Self::new(api_key, DEFAULT_MODEL)
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, request: &ChatRequest) -> AssistantResult<CompletionRequest> {
        let messages = request
            .messages
            .iter()
            .map(to_wire_message)
            .collect::<AssistantResult<Vec<_>>>()?;

        Ok(CompletionRequest {
            model: self.model.clone(),
            messages,
            tools: request.tools.iter().map(to_tool_definition).collect(),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(&self, request: &ChatRequest) -> AssistantResult<ChatCompletion> {
        let body = self.build_request(request)?;
        let response: CompletionResponse = self.client.request("chat/completions", &body).await?;

        let usage = response.usage.as_ref().map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens.unwrap_or(0),
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| invalid_response("openai", "No completion in response"))?;

        let message = from_wire_message(choice.message)?;
        debug!(
            model = %self.model,
            tool_calls = message.tool_calls.len(),
            prompt_tokens = usage.as_ref().map(|u| u.prompt_tokens),
            "chat completion received"
        );

        Ok(ChatCompletion { message, usage })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAIChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIChatModel")
            .field("model", &self.model)
            .field("client", &self.client)
            .finish()
    }
}

// ============================================================================
// WIRE CONVERSION
// ============================================================================

fn to_tool_definition(spec: &ToolSpec) -> ToolDefinition {
    ToolDefinition {
        r#type: "function",
        function: FunctionDefinition {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.parameters.clone(),
        },
    }
}

fn to_wire_message(message: &ChatMessage) -> AssistantResult<Message> {
    let tool_calls = message
        .tool_calls
        .iter()
        .map(|call| {
            let arguments = serde_json::to_string(&call.args)
                .map_err(|e| invalid_response("openai", format!("Unencodable arguments: {}", e)))?;
            Ok(WireToolCall {
                id: call.id.clone(),
                r#type: "function".to_string(),
                function: FunctionCall {
                    name: call.name.clone(),
                    arguments,
                },
            })
        })
        .collect::<AssistantResult<Vec<_>>>()?;

    // Assistant turns that only request tools carry null content on the wire.
    let content = if message.role == Role::Assistant && message.content.is_empty() && !tool_calls.is_empty() {
        None
    } else {
        Some(message.content.clone())
    };

    Ok(Message {
        role: message.role.as_str().to_string(),
        content,
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    })
}

fn from_wire_message(message: Message) -> AssistantResult<ChatMessage> {
    let role = Role::parse(&message.role)
        .map_err(|e| invalid_response("openai", e.to_string()))?;
    if role != Role::Assistant {
        return Err(invalid_response(
            "openai",
            format!("Expected assistant message, got {}", role),
        ));
    }

    let tool_calls = message
        .tool_calls
        .into_iter()
        .map(from_wire_tool_call)
        .collect::<AssistantResult<Vec<_>>>()?;

    Ok(ChatMessage::assistant_with_tools(
        message.content.unwrap_or_default(),
        tool_calls,
    ))
}

fn from_wire_tool_call(call: WireToolCall) -> AssistantResult<ToolCall> {
    let raw = call.function.arguments.trim();
    let args = if raw.is_empty() {
        ToolArguments::new()
    } else {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(other) => {
                return Err(invalid_response(
                    "openai",
                    format!(
                        "Arguments for {} must be a JSON object, got {}",
                        call.function.name, other
                    ),
                ))
            }
            Err(e) => {
                return Err(invalid_response(
                    "openai",
                    format!("Malformed arguments for {}: {}", call.function.name, e),
                ))
            }
        }
    };

    Ok(ToolCall::new(call.id, call.function.name, args))
}
