//! LLM provider implementations.
//!
//! Each provider maps its failures onto [`LlmError`] through the helpers
//! below so the conversation loop only ever sees one error family.

pub mod openai;

use redmine_core::{AssistantError, LlmError};

pub use openai::{OpenAIChatModel, OpenAIClient};

pub(crate) fn request_failed(
    provider: &str,
    status: i32,
    message: impl Into<String>,
) -> AssistantError {
    AssistantError::Llm(LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    })
}

pub(crate) fn rate_limited(provider: &str, retry_after_ms: i64) -> AssistantError {
    AssistantError::Llm(LlmError::RateLimited {
        provider: provider.to_string(),
        retry_after_ms,
    })
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> AssistantError {
    AssistantError::Llm(LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    })
}
