//! Error types for Redmine assistant operations

use crate::{IssueId, ProjectId, UserId};
use thiserror::Error;

/// LLM provider errors. All of them are recoverable at the conversation level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No LLM provider configured")]
    ProviderNotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },
}

/// Tool dispatch errors. These are reported back to the model as tool
/// results, never to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// Conversation loop and session errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("Conversation exceeded {limit} model round trips without an answer")]
    RoundTripLimitExceeded { limit: u32 },

    #[error("Chat turn did not finish within {timeout_ms}ms")]
    TurnTimeout { timeout_ms: u64 },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Query must not be empty")]
    EmptyQuery,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Referential-integrity violations in a dataset.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Duplicate user name: {username}")]
    DuplicateUserName { username: String },

    #[error("Project {project_id} references unknown member {user_id}")]
    UnknownMember { project_id: ProjectId, user_id: UserId },

    #[error("Issue {issue_id} references unknown project {project_id}")]
    UnknownProject { issue_id: IssueId, project_id: ProjectId },

    #[error("Issue {issue_id} is assigned to unknown user {user_id}")]
    UnknownAssignee { issue_id: IssueId, user_id: UserId },
}

/// Master error type for all assistant operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

impl AssistantError {
    /// Recoverable failures end the current turn with a fallback answer
    /// and leave the session usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AssistantError::Llm(_)
                | AssistantError::Tool(_)
                | AssistantError::Agent(AgentError::RoundTripLimitExceeded { .. })
                | AssistantError::Agent(AgentError::TurnTimeout { .. })
        )
    }
}

/// Result type alias for assistant operations.
pub type AssistantResult<T> = Result<T, AssistantError>;

// =============================================================================
// TESTS
// =============================================================================
