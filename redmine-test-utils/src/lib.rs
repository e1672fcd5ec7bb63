//! Redmine Assistant Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for names and filters
//! - Fixtures wiring a scripted model into the assistant service
//! - Assertions over conversation transcripts

pub use redmine_agent::{AgentConfig, AssistantService, ChatReply, ChatTurn, Dataset};
pub use redmine_core::{
    ChatMessage, IssuePriority, IssueStatus, Role, ToolArguments, ToolCall, ToolExchange,
};
pub use redmine_llm::{ProviderRegistry, ScriptStep, ScriptedChatModel};

use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// GENERATORS
// ============================================================================

/// Randomly re-case a string.
fn arb_recase(s: &'static str) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), s.len()).prop_map(move |flips| {
        s.chars()
            .zip(flips)
            .map(|(c, upper)| {
                if upper {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    })
}

/// A seed user as `(id, display name in random letter case)`.
pub fn arb_display_name_case() -> impl Strategy<Value = (i64, String)> {
    prop_oneof![
        arb_recase("dave").prop_map(|name| (101, name)),
        arb_recase("sally").prop_map(|name| (102, name)),
    ]
}

/// A name that matches no seed user.
pub fn arb_unknown_name() -> impl Strategy<Value = String> {
    "[a-z]{1,12}".prop_filter("must not be a seed user", |name| {
        name != "dave" && name != "sally"
    })
}

/// A seed project name in random letter case.
pub fn arb_project_name_case() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_recase("Project Phoenix"),
        arb_recase("Internal Tools"),
        arb_recase("Mobile App Q3"),
    ]
}

/// An optional status filter: absent, a known label in any case, or junk.
pub fn arb_status_filter() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        arb_recase("Open").prop_map(Some),
        arb_recase("In Progress").prop_map(Some),
        arb_recase("Closed").prop_map(Some),
        "[a-z]{3,8}".prop_map(Some),
    ]
}

/// An optional priority filter: absent, a known label in any case, or junk.
pub fn arb_priority_filter() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        arb_recase("Low").prop_map(Some),
        arb_recase("Normal").prop_map(Some),
        arb_recase("High").prop_map(Some),
        arb_recase("Critical").prop_map(Some),
        "[a-z]{3,8}".prop_map(Some),
    ]
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn seeded_dataset() -> Arc<Dataset> {
    Arc::new(Dataset::seed())
}

/// An assistant with default configuration driven by a scripted model.
/// The model handle is returned so tests can inspect recorded requests.
pub fn assistant_with_script(
    steps: impl IntoIterator<Item = ScriptStep>,
) -> (AssistantService, Arc<ScriptedChatModel>) {
    assistant_with_config(AgentConfig::default(), steps)
}

pub fn assistant_with_config(
    config: AgentConfig,
    steps: impl IntoIterator<Item = ScriptStep>,
) -> (AssistantService, Arc<ScriptedChatModel>) {
    let model = Arc::new(ScriptedChatModel::new(steps));
    let service = AssistantService::new(
        &config,
        ProviderRegistry::with_chat(model.clone()),
        seeded_dataset(),
    );
    (service, model)
}

/// Assistant turn requesting a single tool call.
pub fn tool_request(id: &str, tool: &str, args: serde_json::Value) -> ScriptStep {
    ScriptStep::Reply(ChatMessage::assistant_with_tools(
        "",
        vec![ToolCall::new(id, tool, to_arguments(args))],
    ))
}

/// Assistant turn with a plain answer.
pub fn answer(text: &str) -> ScriptStep {
    ScriptStep::Reply(ChatMessage::assistant(text))
}

pub fn to_arguments(value: serde_json::Value) -> ToolArguments {
    match value {
        serde_json::Value::Object(map) => map,
        _ => ToolArguments::new(),
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

/// Assert that every tool-call request in `transcript` is followed by
/// exactly one tool message per call id, directly after the request.
pub fn assert_tool_pairing(transcript: &[ChatMessage]) {
    for (index, message) in transcript.iter().enumerate() {
        if !message.requests_tools() {
            continue;
        }
        let answers: Vec<&str> = transcript[index + 1..]
            .iter()
            .take_while(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        let expected: Vec<&str> = message.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            answers, expected,
            "tool results after message {} do not match its calls",
            index
        );
    }
}
