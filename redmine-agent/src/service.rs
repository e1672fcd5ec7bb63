//! Chat service: sessions, identity and the conversation loop together.

use crate::config::AgentConfig;
use crate::conversation::ConversationLoop;
use crate::dataset::Dataset;
use crate::history::sanitize_history;
use crate::identity::ActingUserProvider;
use crate::prompt::SystemPrompt;
use crate::registry::ToolRegistry;
use crate::session::{Session, SessionStore};
use redmine_core::{AgentError, AssistantResult, ChatMessage, SessionId, ToolExchange};
use redmine_llm::{ProviderRegistry, UsageTracker};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, Instrument};

/// One user message submitted to the assistant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatTurn {
    /// Existing session to continue; a new one is created when absent
    pub session_id: Option<SessionId>,
    pub query: String,
    /// Caller-owned history replacing whatever the session stored
    pub prior_history: Option<Vec<ChatMessage>>,
    /// Acting user claimed by the calling surface
    pub acting_user_hint: Option<String>,
}

impl ChatTurn {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn in_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.prior_history = Some(history);
        self
    }

    pub fn acting_as(mut self, username: impl Into<String>) -> Self {
        self.acting_user_hint = Some(username.into());
        self
    }
}

/// The assistant's answer to one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub session_id: SessionId,
    pub message: String,
    pub tool_exchanges: Vec<ToolExchange>,
    pub round_trips: u32,
    /// True when the turn failed and `message` is the fallback text
    pub fallback: bool,
}

/// Entry point used by the chat surfaces.
#[derive(Debug, Clone)]
pub struct AssistantService {
    conversation: ConversationLoop,
    sessions: Arc<SessionStore>,
    prompt: SystemPrompt,
    identity: Arc<dyn ActingUserProvider>,
    turn_timeout: Duration,
    fallback_message: String,
}

impl AssistantService {
    pub fn new(config: &AgentConfig, providers: ProviderRegistry, dataset: Arc<Dataset>) -> Self {
        let conversation = ConversationLoop::new(
            providers,
            ToolRegistry::standard(),
            dataset,
            config.max_round_trips,
            config.model_timeout,
        );
        Self {
            conversation,
            sessions: Arc::new(SessionStore::new()),
            prompt: SystemPrompt::new(config.reply_language.clone()),
            identity: config.acting_user_provider(),
            turn_timeout: config.turn_timeout,
            fallback_message: config.fallback_message.clone(),
        }
    }

    /// Replace the acting-user policy.
    pub fn with_identity(mut self, identity: Arc<dyn ActingUserProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        self.conversation.usage()
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        self.conversation.dataset()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Answer one user message.
    ///
    /// Recoverable failures (model errors, timeouts, the round-trip cap)
    /// produce the fallback reply and leave the stored history untouched.
    /// The whole turn is bounded by `AgentConfig::turn_timeout`.
    ///
    /// # Errors
    /// * `AgentError::EmptyQuery` - the query is blank
    pub async fn chat(&self, turn: ChatTurn) -> AssistantResult<ChatReply> {
        if turn.query.trim().is_empty() {
            return Err(AgentError::EmptyQuery.into());
        }

        let acting_user = self.identity.acting_user(turn.acting_user_hint.as_deref());
        let handle = self
            .sessions
            .get_or_create(turn.session_id.as_deref(), &acting_user);
        let mut session = handle.lock().await;

        let span = info_span!(
            "chat_turn",
            session_id = %session.id,
            acting_user = %acting_user
        );
        self.run_turn(&mut session, turn, acting_user)
            .instrument(span)
            .await
    }

    async fn run_turn(
        &self,
        session: &mut Session,
        turn: ChatTurn,
        acting_user: String,
    ) -> AssistantResult<ChatReply> {
        let base = turn
            .prior_history
            .unwrap_or_else(|| session.messages.clone());
        let mut history = sanitize_history(base);
        history.push(ChatMessage::user(turn.query));
        self.prompt.ensure_in(&mut history, &acting_user);

        let outcome = match tokio::time::timeout(self.turn_timeout, self.conversation.run(history)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::TurnTimeout {
                timeout_ms: self.turn_timeout.as_millis() as u64,
            }
            .into()),
        };

        match outcome {
            Ok(outcome) => {
                session.acting_user = acting_user;
                session.commit(outcome.transcript);
                info!(
                    round_trips = outcome.round_trips,
                    prompt_tokens = outcome.usage.prompt_tokens,
                    completion_tokens = outcome.usage.completion_tokens,
                    "Chat turn completed"
                );
                Ok(ChatReply {
                    session_id: session.id.clone(),
                    message: outcome.answer,
                    tool_exchanges: outcome.exchanges,
                    round_trips: outcome.round_trips,
                    fallback: false,
                })
            }
            Err(err) if err.is_recoverable() => {
                error!(error = %err, "Chat turn failed, returning fallback");
                Ok(ChatReply {
                    session_id: session.id.clone(),
                    message: self.fallback_message.clone(),
                    tool_exchanges: Vec::new(),
                    round_trips: 0,
                    fallback: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Discard a session's history, keeping its id.
    pub async fn reset(&self, session_id: &str) -> AssistantResult<()> {
        self.sessions.reset(session_id).await?;
        info!(session_id, "Session reset");
        Ok(())
    }

    /// Snapshot of a session's stored history.
    pub async fn transcript(&self, session_id: &str) -> AssistantResult<Vec<ChatMessage>> {
        Ok(self.sessions.snapshot(session_id).await?.messages)
    }

    pub async fn session(&self, session_id: &str) -> AssistantResult<Session> {
        self.sessions.snapshot(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redmine_core::{AssistantError, LlmError, Role, ToolArguments, ToolCall};
    use redmine_llm::{ScriptStep, ScriptedChatModel};

    fn service(model: Arc<ScriptedChatModel>) -> AssistantService {
        AssistantService::new(
            &AgentConfig::default(),
            ProviderRegistry::with_chat(model),
            Arc::new(Dataset::seed()),
        )
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let svc = service(Arc::new(ScriptedChatModel::replies([])));
        let err = svc.chat(ChatTurn::new("   ")).await.unwrap_err();
        assert_eq!(err, AssistantError::Agent(AgentError::EmptyQuery));
        assert_eq!(svc.session_count(), 0);
    }

    #[tokio::test]
    async fn test_first_turn_injects_personalized_system_message() {
        let model = Arc::new(ScriptedChatModel::replies([ChatMessage::assistant("Hola")]));
        let svc = service(model.clone());
        let reply = svc.chat(ChatTurn::new("hola")).await.unwrap();
        assert!(!reply.fallback);

        let requests = model.requests();
        let sent = &requests[0].messages;
        assert!(sent[0].is_system());
        assert!(sent[0].content.contains("The current user's name is: sally"));
        assert_eq!(sent[1], ChatMessage::user("hola"));

        let stored = svc.transcript(&reply.session_id).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_history_accumulates_across_turns() {
        let model = Arc::new(ScriptedChatModel::replies([
            ChatMessage::assistant("uno"),
            ChatMessage::assistant("dos"),
        ]));
        let svc = service(model.clone());
        let first = svc.chat(ChatTurn::new("a")).await.unwrap();
        let second = svc
            .chat(ChatTurn::new("b").in_session(first.session_id.clone()))
            .await
            .unwrap();
        assert_eq!(second.session_id, first.session_id);
        assert_eq!(second.message, "dos");
        // system, a, uno, b
        assert_eq!(model.requests()[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_turn_returns_fallback_and_keeps_history() {
        let model = Arc::new(ScriptedChatModel::new([
            ScriptStep::Reply(ChatMessage::assistant("primero")),
            ScriptStep::Reply(ChatMessage::assistant_with_tools(
                "",
                vec![ToolCall::new("c1", "get_all_projects", ToolArguments::new())],
            )),
            ScriptStep::Fail(LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: "garbled".to_string(),
            }),
        ]));
        let svc = service(model);
        let first = svc.chat(ChatTurn::new("hola")).await.unwrap();
        let before = svc.transcript(&first.session_id).await.unwrap();

        let reply = svc
            .chat(ChatTurn::new("proyectos").in_session(first.session_id.clone()))
            .await
            .unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.message, AgentConfig::default().fallback_message);
        assert_eq!(svc.transcript(&first.session_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_turn_deadline_covers_tool_rounds() {
        // Each call fits the per-call deadline; the turn as a whole does not.
        let model = Arc::new(ScriptedChatModel::new([
            ScriptStep::Reply(ChatMessage::assistant_with_tools(
                "",
                vec![ToolCall::new("c1", "get_all_projects", ToolArguments::new())],
            )),
            ScriptStep::Delayed(
                std::time::Duration::from_millis(300),
                ChatMessage::assistant("tarde"),
            ),
        ]));
        let config = AgentConfig {
            model_timeout: std::time::Duration::from_millis(500),
            turn_timeout: std::time::Duration::from_millis(100),
            ..AgentConfig::default()
        };
        let svc = AssistantService::new(
            &config,
            ProviderRegistry::with_chat(model),
            Arc::new(Dataset::seed()),
        );

        let reply = svc.chat(ChatTurn::new("proyectos")).await.unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.message, config.fallback_message);
        assert!(svc.transcript(&reply.session_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prior_history_replaces_stored_history() {
        let model = Arc::new(ScriptedChatModel::replies([ChatMessage::assistant("ok")]));
        let svc = service(model.clone());
        let history = vec![
            ChatMessage::user("antes"),
            ChatMessage::tool("orphan", "[]"),
            ChatMessage::assistant("respuesta"),
        ];
        svc.chat(ChatTurn::new("ahora").with_history(history))
            .await
            .unwrap();

        let requests = model.requests();
        let sent = &requests[0].messages;
        // system, antes, respuesta, ahora (orphan dropped)
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|m| m.role != Role::Tool));
    }

    #[tokio::test]
    async fn test_reset_and_unknown_session() {
        let svc = service(Arc::new(ScriptedChatModel::replies([ChatMessage::assistant("hi")])));
        let reply = svc.chat(ChatTurn::new("hola")).await.unwrap();
        svc.reset(&reply.session_id).await.unwrap();
        assert!(svc.transcript(&reply.session_id).await.unwrap().is_empty());

        let err = svc.reset("missing").await.unwrap_err();
        assert!(matches!(err, AssistantError::Agent(AgentError::SessionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_untrusted_hint_is_ignored() {
        let model = Arc::new(ScriptedChatModel::replies([ChatMessage::assistant("hi")]));
        let svc = service(model.clone());
        let reply = svc.chat(ChatTurn::new("hola").acting_as("dave")).await.unwrap();
        let session = svc.session(&reply.session_id).await.unwrap();
        assert_eq!(session.acting_user, "sally");
    }
}
