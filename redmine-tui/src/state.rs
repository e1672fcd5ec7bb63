//! Chat screen state.

use crate::api_client::ApiClient;
use crate::config::TuiConfig;
use crate::fallback::fallback_reply;
use crate::notifications::{Notification, NotificationLevel};
use crate::theme::SynthBruteTheme;
use crossterm::event::KeyEvent;
use redmine_api::types::{ChatRequest, ChatResponse};
use tui_textarea::TextArea;

pub const GREETING: &str = "¡Hola! Soy tu asistente de Redmine. ¿En qué puedo ayudarte hoy?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    Tool,
    /// Reply produced locally because the server was unreachable
    Offline,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "Tú",
            Speaker::Assistant => "Asistente",
            Speaker::Tool => "Herramienta",
            Speaker::Offline => "Sin conexión",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub speaker: Speaker,
    pub text: String,
}

impl Entry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

pub struct App {
    pub config: TuiConfig,
    pub theme: SynthBruteTheme,
    pub api: ApiClient,
    pub transcript: Vec<Entry>,
    pub input: TextArea<'static>,
    pub session_id: Option<String>,
    /// A chat request is in flight
    pub pending: bool,
    /// Lines scrolled back from the bottom of the transcript
    pub scroll_back: u16,
    pub notifications: Vec<Notification>,
}

impl App {
    pub fn new(config: TuiConfig, api: ApiClient) -> Self {
        Self {
            config,
            theme: SynthBruteTheme::synthbrute(),
            api,
            transcript: vec![Entry::new(Speaker::Assistant, GREETING)],
            input: new_input(),
            session_id: None,
            pending: false,
            scroll_back: 0,
            notifications: Vec::new(),
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn edit(&mut self, key: KeyEvent) {
        self.input.input(key);
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    /// Take the typed question, echo it and build the request.
    ///
    /// Returns `None` while a request is in flight or when the input is blank.
    pub fn submit_input(&mut self) -> Option<ChatRequest> {
        if self.pending {
            return None;
        }
        let query = self.input_text().trim().to_string();
        if query.is_empty() {
            return None;
        }

        self.input = new_input();
        self.transcript.push(Entry::new(Speaker::User, query.clone()));
        self.pending = true;
        self.scroll_back = 0;
        Some(ChatRequest {
            query,
            conversation_history: None,
            session_id: self.session_id.clone(),
        })
    }

    pub fn apply_reply(&mut self, response: ChatResponse) {
        self.pending = false;
        self.session_id = Some(response.session_id);

        if self.config.show_tool_calls {
            let calls = response.tool_calls.unwrap_or_default();
            let results = response.tool_results.unwrap_or_default();
            for call in calls {
                let args = serde_json::Value::Object(call.args);
                let result = results
                    .iter()
                    .find(|r| r.tool_call_id == call.id)
                    .map(|r| r.content.as_str())
                    .unwrap_or("");
                self.transcript.push(Entry::new(
                    Speaker::Tool,
                    format!("{}({}) -> {}", call.name, args, result),
                ));
            }
        }

        self.transcript.push(Entry::new(Speaker::Assistant, response.response));
        if response.fallback {
            self.notify(NotificationLevel::Warning, "The assistant could not complete this turn");
        }
        self.scroll_back = 0;
    }

    pub fn apply_failure(&mut self, query: &str, error: impl Into<String>) {
        self.pending = false;
        self.transcript.push(Entry::new(Speaker::Offline, fallback_reply(query)));
        self.notify(NotificationLevel::Error, error);
        self.scroll_back = 0;
    }

    /// Restore the greeting. Returns the session whose server history
    /// should be reset, if any.
    pub fn clear_chat(&mut self) -> Option<String> {
        self.transcript = vec![Entry::new(Speaker::Assistant, GREETING)];
        self.scroll_back = 0;
        self.notifications.clear();
        self.session_id.clone()
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }
}

fn new_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_placeholder_text("Pregúntame sobre Redmine...");
    input
}
