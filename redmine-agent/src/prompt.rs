//! System prompt template and injection.

use redmine_core::ChatMessage;

pub const USER_NAME_PLACEHOLDER: &str = "USER_NAME";
const LANGUAGE_PLACEHOLDER: &str = "REPLY_LANGUAGE";

pub const DEFAULT_REPLY_LANGUAGE: &str = "Spanish";

const TEMPLATE: &str = "You are a helpful Redmine assistant. You have access to tools to help users manage their projects and issues.

Key capabilities:
- Look up user information and projects
- View and filter issues by project, status, or priority
- Show assigned issues for users

When users ask vague questions, ask for clarification. Be conversational and helpful.
Always format your responses clearly, using bullet points or numbered lists when showing multiple items.
Your answer always must be in REPLY_LANGUAGE.

IMPORTANT: The current user's name is: USER_NAME
When the user asks about \"my projects\" or \"my tasks\", automatically use USER_NAME as their username without asking for it.
";

/// Renders the system message for an acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    reply_language: String,
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_LANGUAGE)
    }
}

impl SystemPrompt {
    pub fn new(reply_language: impl Into<String>) -> Self {
        Self {
            reply_language: reply_language.into(),
        }
    }

    pub fn render(&self, acting_user: &str) -> String {
        TEMPLATE
            .replace(LANGUAGE_PLACEHOLDER, &self.reply_language)
            .replace(USER_NAME_PLACEHOLDER, acting_user)
    }

    /// Prepend a system message unless the history already has one.
    /// Returns whether a message was added.
    pub fn ensure_in(&self, history: &mut Vec<ChatMessage>, acting_user: &str) -> bool {
        if history.iter().any(ChatMessage::is_system) {
            return false;
        }
        history.insert(0, ChatMessage::system(self.render(acting_user)));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_every_placeholder() {
        let text = SystemPrompt::default().render("sally");
        assert!(!text.contains(USER_NAME_PLACEHOLDER));
        assert!(!text.contains(LANGUAGE_PLACEHOLDER));
        assert_eq!(text.matches("sally").count(), 2);
        assert!(text.contains("must be in Spanish"));
    }

    #[test]
    fn test_ensure_in_prepends_once() {
        let prompt = SystemPrompt::new("English");
        let mut history = vec![ChatMessage::user("hi")];
        assert!(prompt.ensure_in(&mut history, "dave"));
        assert!(history[0].is_system());
        assert!(history[0].content.contains("dave"));
        assert!(history[0].content.contains("must be in English"));

        assert!(!prompt.ensure_in(&mut history, "sally"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_existing_system_message_is_kept_anywhere() {
        let mut history = vec![ChatMessage::user("hi"), ChatMessage::system("custom")];
        assert!(!SystemPrompt::default().ensure_in(&mut history, "dave"));
        assert_eq!(history[1].content, "custom");
    }
}
