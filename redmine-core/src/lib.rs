//! Redmine Assistant Core - Data Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! Dataset entities, conversation messages and the error taxonomy live here;
//! lookups and orchestration live in redmine-agent.

mod entities;
mod enums;
mod error;
mod message;

pub use entities::{Issue, Project, User};
pub use enums::{EnumParseError, IssuePriority, IssueStatus, Role};
pub use error::{
    AgentError, AssistantError, AssistantResult, ConfigError, DatasetError, LlmError, ToolError,
};
pub use message::{ChatMessage, ToolArguments, ToolCall, ToolExchange};

use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Numeric user identifier, unique within the dataset.
pub type UserId = i64;

/// Numeric project identifier.
pub type ProjectId = i64;

/// Numeric issue identifier.
pub type IssueId = i64;

/// Conversation session identifier. Callers may supply their own.
pub type SessionId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new session identifier (UUIDv7, timestamp-sortable).
pub fn new_session_id() -> SessionId {
    Uuid::now_v7().to_string()
}

/// Coerce a textual user identifier into a [`UserId`].
///
/// Surrounding whitespace is ignored. Anything that is not an integer
/// yields `None`.
pub fn coerce_user_id(raw: &str) -> Option<UserId> {
    raw.trim().parse::<UserId>().ok()
}
