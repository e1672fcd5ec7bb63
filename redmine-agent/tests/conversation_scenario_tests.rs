//! Scenario and Property Tests for the Conversation Loop
//!
//! Drives the assistant service with a scripted model and checks the
//! transcripts it leaves behind.

use proptest::prelude::*;
use redmine_agent::{AgentConfig, ChatTurn};
use redmine_core::{LlmError, Role, ToolArguments, ToolCall};
use redmine_test_utils::{
    answer, assert_tool_pairing, assistant_with_config, assistant_with_script, tool_request,
    ChatMessage, ScriptStep,
};
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;

#[tokio::test]
async fn test_projects_of_acting_user() {
    let (svc, model) = assistant_with_script([
        tool_request("call_1", "get_projects_for_user", json!({"__arg1": "102"})),
        answer("Sally participa en:\n- Project Phoenix\n- Mobile App Q3"),
    ]);

    let reply = svc
        .chat(ChatTurn::new("What projects is sally in?"))
        .await
        .unwrap();

    assert!(!reply.fallback);
    assert_eq!(reply.round_trips, 2);
    assert_eq!(reply.tool_exchanges.len(), 1);
    assert_eq!(reply.tool_exchanges[0].call.name, "get_projects_for_user");
    assert_eq!(
        reply.tool_exchanges[0].result,
        r#"["Project Phoenix","Mobile App Q3"]"#
    );
    assert!(reply.message.contains("Project Phoenix"));
    assert!(reply.message.contains("Mobile App Q3"));
    assert_eq!(model.call_count(), 2);

    let transcript = svc.transcript(&reply.session_id).await.unwrap();
    assert_tool_pairing(&transcript);
}

#[tokio::test]
async fn test_unknown_project_yields_empty_result() {
    let (svc, _model) = assistant_with_script([
        tool_request("call_1", "get_issues_for_project", json!({"__arg1": "Nonexistent"})),
        answer("No encontré ningún proyecto llamado 'Nonexistent'."),
    ]);

    let reply = svc
        .chat(ChatTurn::new("list issues for project 'Nonexistent'"))
        .await
        .unwrap();
    assert_eq!(reply.tool_exchanges[0].result, "[]");
    assert!(reply.message.contains("Nonexistent"));
}

#[tokio::test]
async fn test_failure_mid_loop_leaves_no_partial_tool_messages() {
    let (svc, _model) = assistant_with_script([
        answer("Hola"),
        tool_request("call_1", "get_all_projects", json!({})),
        ScriptStep::Fail(LlmError::RequestFailed {
            provider: "openai".to_string(),
            status: 500,
            message: "internal".to_string(),
        }),
        answer("Hay tres proyectos."),
    ]);

    let first = svc.chat(ChatTurn::new("hola")).await.unwrap();
    let failed = svc
        .chat(ChatTurn::new("¿Qué proyectos hay?").in_session(first.session_id.clone()))
        .await
        .unwrap();
    assert!(failed.fallback);
    assert!(failed.tool_exchanges.is_empty());

    let transcript = svc.transcript(&first.session_id).await.unwrap();
    assert_eq!(transcript.len(), 3);
    assert!(transcript.iter().all(|m| m.role != Role::Tool));

    // The session stays usable.
    let retry = svc
        .chat(ChatTurn::new("¿Qué proyectos hay?").in_session(first.session_id.clone()))
        .await
        .unwrap();
    assert!(!retry.fallback);
    assert_eq!(retry.message, "Hay tres proyectos.");
}

#[tokio::test]
async fn test_round_trip_cap_produces_fallback() {
    let config = AgentConfig {
        max_round_trips: 2,
        ..AgentConfig::default()
    };
    let (svc, model) = assistant_with_config(
        config,
        (0..4).map(|i| tool_request(&format!("c{}", i), "get_all_projects", json!({}))),
    );

    let reply = svc.chat(ChatTurn::new("loop")).await.unwrap();
    assert!(reply.fallback);
    assert_eq!(model.call_count(), 2);
    assert!(svc.transcript(&reply.session_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_model_timeout_produces_fallback() {
    let config = AgentConfig {
        model_timeout: Duration::from_millis(20),
        ..AgentConfig::default()
    };
    let (svc, _model) = assistant_with_config(
        config,
        [ScriptStep::Delayed(
            Duration::from_secs(10),
            ChatMessage::assistant("late"),
        )],
    );
    let reply = svc.chat(ChatTurn::new("hola")).await.unwrap();
    assert!(reply.fallback);
}

#[tokio::test]
async fn test_concurrent_turns_on_one_session_are_serialized() {
    let (svc, _model) = assistant_with_script([
        answer("primero"),
        tool_request("c1", "get_all_projects", json!({})),
        answer("segundo"),
        tool_request("c2", "get_user_name", json!({"__arg1": "dave"})),
        answer("tercero"),
    ]);
    let first = svc.chat(ChatTurn::new("inicio")).await.unwrap();
    let session_id = first.session_id.clone();

    let a = svc.chat(ChatTurn::new("a").in_session(session_id.clone()));
    let b = svc.chat(ChatTurn::new("b").in_session(session_id.clone()));
    let (a, b) = tokio::join!(a, b);
    assert!(!a.unwrap().fallback);
    assert!(!b.unwrap().fallback);

    let transcript = svc.transcript(&session_id).await.unwrap();
    assert_tool_pairing(&transcript);
    let users: Vec<_> = transcript
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(users.len(), 3);
    // system + 3 user + 3 answers + 2 requests + 2 results
    assert_eq!(transcript.len(), 11);
}

#[tokio::test]
async fn test_caller_history_with_tool_metadata_is_repaired() {
    let (svc, model) = assistant_with_script([answer("ok")]);
    let history = vec![
        ChatMessage::user("¿proyectos?"),
        ChatMessage::assistant_with_tools(
            "",
            vec![ToolCall::new("old", "get_all_projects", ToolArguments::new())],
        ),
        ChatMessage::tool("old", r#"["Project Phoenix"]"#),
        ChatMessage::tool("stray", "[]"),
        ChatMessage::assistant("Project Phoenix"),
    ];
    svc.chat(ChatTurn::new("gracias").with_history(history))
        .await
        .unwrap();

    let requests = model.requests();
    let sent = &requests[0].messages;
    assert_tool_pairing(sent);
    assert_eq!(
        sent.iter().filter(|m| m.role == Role::Tool).count(),
        1,
        "stray tool message must be dropped"
    );
}

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every call id of a tool request gets exactly one tool message,
    /// directly after the request and in request order.
    #[test]
    fn prop_every_call_id_answered_once(call_count in 1usize..5) {
        let calls: Vec<ToolCall> = (0..call_count)
            .map(|i| ToolCall::new(format!("call_{}", i), "get_all_projects", ToolArguments::new()))
            .collect();
        let (svc, _model) = assistant_with_script([
            ScriptStep::Reply(ChatMessage::assistant_with_tools("", calls)),
            answer("listo"),
        ]);

        let rt = test_runtime()?;
        let reply = rt
            .block_on(svc.chat(ChatTurn::new("proyectos")))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let transcript = rt
            .block_on(svc.transcript(&reply.session_id))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        assert_tool_pairing(&transcript);
        prop_assert_eq!(reply.tool_exchanges.len(), call_count);
        prop_assert_eq!(
            transcript.iter().filter(|m| m.role == Role::Tool).count(),
            call_count
        );
    }
}
