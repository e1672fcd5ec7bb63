//! Conversation history repair.
//!
//! A tool message is only valid while it answers a pending call of the
//! assistant message directly before it (other tool messages may sit in
//! between). Anything else is dropped with a warning. Calls that never got
//! an answer are stripped from their assistant message, which is removed
//! entirely if nothing is left of it.

use redmine_core::{ChatMessage, Role};
use std::collections::HashSet;
use tracing::warn;

/// The assistant message whose tool calls are still being answered.
struct OpenRequest {
    index: usize,
    pending: HashSet<String>,
    answered: HashSet<String>,
}

impl OpenRequest {
    fn new(index: usize, message: &ChatMessage) -> Self {
        Self {
            index,
            pending: message.tool_calls.iter().map(|c| c.id.clone()).collect(),
            answered: HashSet::new(),
        }
    }

    fn answer(&mut self, call_id: &str) -> bool {
        self.pending.contains(call_id) && self.answered.insert(call_id.to_string())
    }

    fn close(self, out: &mut Vec<ChatMessage>) {
        if self.answered.len() == self.pending.len() {
            return;
        }
        let Some(request) = out.get_mut(self.index) else {
            return;
        };

        let before = request.tool_calls.len();
        request.tool_calls.retain(|c| self.answered.contains(&c.id));
        warn!(
            stripped = before - request.tool_calls.len(),
            "Dropping unanswered tool calls from history"
        );

        if request.tool_calls.is_empty() && request.content.trim().is_empty() {
            out.remove(self.index);
        }
    }
}

/// Repair a history so that every tool message pairs with a call of the
/// preceding assistant message and every call has exactly one answer.
pub fn sanitize_history(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len());
    let mut open: Option<OpenRequest> = None;

    for message in messages {
        if message.role == Role::Tool {
            let answered = match (open.as_mut(), message.tool_call_id.as_deref()) {
                (Some(request), Some(call_id)) => request.answer(call_id),
                _ => false,
            };
            if answered {
                out.push(message);
            } else {
                warn!(
                    tool_call_id = message.tool_call_id.as_deref().unwrap_or(""),
                    "Dropping tool message without a matching pending call"
                );
            }
            continue;
        }

        if let Some(request) = open.take() {
            request.close(&mut out);
        }
        if message.requests_tools() {
            open = Some(OpenRequest::new(out.len(), &message));
        }
        out.push(message);
    }

    if let Some(request) = open.take() {
        request.close(&mut out);
    }
    out
}
