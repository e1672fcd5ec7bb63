//! Request and response bodies of the HTTP surface.

use redmine_agent::{ChatReply, Session};
use redmine_core::{ChatMessage, Timestamp, ToolCall};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's question
    pub query: String,
    /// Caller-owned history. When present it replaces the stored history.
    #[serde(default)]
    pub conversation_history: Option<Vec<ChatMessage>>,
    /// Session to continue; a new one is created when absent or unknown
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Result of one tool call, keyed by the call it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolResultView {
    pub tool_call_id: String,
    pub content: String,
}

/// Body returned by `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// Final assistant answer, or the fallback apology
    pub response: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<ToolResultView>>,
    /// True when the turn failed and `response` is the fallback message
    pub fallback: bool,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        let (tool_calls, tool_results) = if reply.tool_exchanges.is_empty() {
            (None, None)
        } else {
            let results = reply
                .tool_exchanges
                .iter()
                .map(|exchange| ToolResultView {
                    tool_call_id: exchange.call.id.clone(),
                    content: exchange.result.clone(),
                })
                .collect();
            let calls = reply.tool_exchanges.into_iter().map(|e| e.call).collect();
            (Some(calls), Some(results))
        };

        Self {
            response: reply.message,
            session_id: reply.session_id,
            tool_calls,
            tool_results,
            fallback: reply.fallback,
        }
    }
}

/// Stored conversation of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionTranscript {
    pub session_id: String,
    pub acting_user: String,
    pub messages: Vec<ChatMessage>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: Timestamp,
}

impl From<Session> for SessionTranscript {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            acting_user: session.acting_user,
            messages: session.messages,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Body returned by `DELETE /chat/sessions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    pub session_id: String,
    pub reset: bool,
}

/// Body returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
}
