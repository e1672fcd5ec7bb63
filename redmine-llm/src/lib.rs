//! Redmine Assistant LLM - Chat Model Abstraction
//!
//! Provider-agnostic traits for tool-calling chat completion.
//! This crate defines the interface the conversation loop talks to, a
//! provider registry, usage accounting and a scripted model for tests.
//! Concrete providers live in [`providers`].

pub mod providers;

use async_trait::async_trait;
use redmine_core::{AssistantError, AssistantResult, ChatMessage, LlmError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// A tool advertised to the model: name, description and JSON Schema for
/// its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One decision request: the full history plus the tools the model may call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
}

/// Token usage reported by a provider for a single completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// The model's reply: an assistant message that either answers directly or
/// requests tool calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub message: ChatMessage,
    pub usage: Option<TokenUsage>,
}

impl ChatCompletion {
    pub fn new(message: ChatMessage) -> Self {
        Self {
            message,
            usage: None,
        }
    }
}

// ============================================================================
// CHAT MODEL TRAIT
// ============================================================================

/// Trait for tool-calling chat models.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// struct MyModel { /* ... */ }
///
/// #[async_trait]
/// impl ChatModel for MyModel {
///     async fn complete(&self, request: &ChatRequest) -> AssistantResult<ChatCompletion> {
///         // Call the provider API
///     }
///     fn model_id(&self) -> &str { "my-model" }
/// }
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Ask the model to either answer or request tool calls.
    ///
    /// # Returns
    /// * `Ok(ChatCompletion)` - The assistant message
    /// * `Err(AssistantError::Llm)` - Provider failure or malformed payload
    async fn complete(&self, request: &ChatRequest) -> AssistantResult<ChatCompletion>;

    /// Model identifier (e.g., "gpt-4.1")
    fn model_id(&self) -> &str;
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Registry for the chat model provider.
/// Providers must be explicitly registered - no auto-discovery.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    chat: Option<Arc<dyn ChatModel>>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry.
    pub fn new() -> Self {
        Self { chat: None }
    }

    /// Create a registry holding the given model.
    pub fn with_chat(model: Arc<dyn ChatModel>) -> Self {
        Self { chat: Some(model) }
    }

    /// Get the registered chat model.
    ///
    /// # Returns
    /// * `Err(AssistantError::Llm(LlmError::ProviderNotConfigured))` - If none registered
    pub fn chat(&self) -> AssistantResult<Arc<dyn ChatModel>> {
        self.chat
            .clone()
            .ok_or(AssistantError::Llm(LlmError::ProviderNotConfigured))
    }

    pub fn has_chat(&self) -> bool {
        self.chat.is_some()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("chat", &self.chat.as_ref().map(|m| m.model_id().to_string()))
            .finish()
    }
}

// ============================================================================
// USAGE TRACKER
// ============================================================================

/// Tracks token usage across all completions.
/// Thread-safe via atomic operations.
#[derive(Default)]
pub struct UsageTracker {
    requests: AtomicI64,
    prompt_tokens: AtomicI64,
    completion_tokens: AtomicI64,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completion request and its reported usage.
    pub fn record(&self, usage: Option<TokenUsage>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(usage) = usage {
            self.prompt_tokens
                .fetch_add(usage.prompt_tokens, Ordering::Relaxed);
            self.completion_tokens
                .fetch_add(usage.completion_tokens, Ordering::Relaxed);
        }
    }

    pub fn requests(&self) -> i64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn prompt_tokens(&self) -> i64 {
        self.prompt_tokens.load(Ordering::Relaxed)
    }

    pub fn completion_tokens(&self) -> i64 {
        self.completion_tokens.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.prompt_tokens.store(0, Ordering::Relaxed);
        self.completion_tokens.store(0, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("requests", &self.requests())
            .field("prompt_tokens", &self.prompt_tokens())
            .field("completion_tokens", &self.completion_tokens())
            .finish()
    }
}

// ============================================================================
// SCRIPTED MODEL FOR TESTING
// ============================================================================

/// One scripted model turn.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Return this assistant message
    Reply(ChatMessage),
    /// Fail with this error
    Fail(LlmError),
    /// Sleep, then reply (used to exercise call timeouts)
    Delayed(Duration, ChatMessage),
}

/// Chat model that replays a fixed script and records every request.
/// Running past the end of the script is an `InvalidResponse` error.
pub struct ScriptedChatModel {
    model_id: String,
    script: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatModel {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            model_id: "scripted".to_string(),
            script: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script made only of replies.
    pub fn replies(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        Self::new(messages.into_iter().map(ScriptStep::Reply))
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn next_step(&self) -> Option<ScriptStep> {
        self.script.lock().ok()?.pop_front()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, request: &ChatRequest) -> AssistantResult<ChatCompletion> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.next_step() {
            Some(ScriptStep::Reply(message)) => Ok(ChatCompletion::new(message)),
            Some(ScriptStep::Fail(err)) => Err(err.into()),
            Some(ScriptStep::Delayed(delay, message)) => {
                tokio::time::sleep(delay).await;
                Ok(ChatCompletion::new(message))
            }
            None => Err(providers::invalid_response(
                &self.model_id,
                "script exhausted",
            )),
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl std::fmt::Debug for ScriptedChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedChatModel")
            .field("remaining", &self.remaining())
            .field("calls", &self.call_count())
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
