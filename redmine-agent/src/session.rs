//! In-memory session store.
//!
//! Each session sits behind its own async mutex. A chat turn holds that
//! mutex from the moment it reads the history until it commits the new
//! transcript, so turns on one session are serialized and a reader never
//! sees a partial set of tool results. Different sessions never contend.

use chrono::Utc;
use dashmap::DashMap;
use redmine_core::{new_session_id, AgentError, AssistantResult, ChatMessage, SessionId, Timestamp};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub acting_user: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Session {
    pub fn new(id: SessionId, acting_user: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            acting_user: acting_user.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the history with the transcript of a completed turn.
    pub fn commit(&mut self, transcript: Vec<ChatMessage>) {
        self.messages = transcript;
        self.updated_at = Utc::now();
    }

    /// Discard the history, keeping the id.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Sessions keyed by id, alive for the lifetime of the process.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating it on first use. Without an id a fresh
    /// one is generated.
    pub fn get_or_create(&self, session_id: Option<&str>, acting_user: &str) -> SessionHandle {
        let id = session_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(new_session_id);

        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id, acting_user))))
            .value()
            .clone()
    }

    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    fn require(&self, session_id: &str) -> AssistantResult<SessionHandle> {
        self.get(session_id).ok_or_else(|| {
            AgentError::SessionNotFound {
                session_id: session_id.to_string(),
            }
            .into()
        })
    }

    /// Discard a session's messages. Waits for any turn in flight.
    pub async fn reset(&self, session_id: &str) -> AssistantResult<()> {
        let handle = self.require(session_id)?;
        handle.lock().await.reset();
        Ok(())
    }

    /// Copy of a session's stored history.
    pub async fn snapshot(&self, session_id: &str) -> AssistantResult<Session> {
        let handle = self.require(session_id)?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
