//! Event types for the TUI event loop.

use crossterm::event::KeyEvent;
use redmine_api::types::ChatResponse;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    ChatReplied(ChatResponse),
    ChatFailed { query: String, error: String },
    SessionReset(Result<String, String>),
}
