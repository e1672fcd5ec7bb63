//! Redmine Assistant Agent
//!
//! The project/issue dataset, the five lookup tools the model may call, and
//! the tool-calling conversation loop with per-session history.
//!
//! ```text
//! AssistantService ──► SessionStore (per-session lock)
//!        │
//!        ▼
//! ConversationLoop ──► ChatModel (redmine-llm)
//!        │
//!        ▼
//!  ToolRegistry ──► LookupTools ──► Dataset
//! ```

pub mod config;
pub mod conversation;
pub mod dataset;
pub mod history;
pub mod identity;
pub mod prompt;
pub mod registry;
pub mod service;
pub mod session;
pub mod tools;

pub use config::{AgentConfig, DEFAULT_FALLBACK_MESSAGE, NO_ANSWER_MESSAGE};
pub use conversation::{ConversationLoop, TurnOutcome};
pub use dataset::Dataset;
pub use history::sanitize_history;
pub use identity::{ActingUserProvider, FixedActingUser, TrustedHintActingUser};
pub use prompt::SystemPrompt;
pub use registry::{ToolInvocation, ToolKind, ToolOutcome, ToolRegistry, POSITIONAL_ARG};
pub use service::{AssistantService, ChatReply, ChatTurn};
pub use session::{Session, SessionHandle, SessionStore};
pub use tools::{AssignedIssue, LookupTools, ProjectIssue, UNASSIGNED, UNKNOWN_PROJECT};
