//! In-process tests of the HTTP surface, driven through `oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use redmine_api::{create_api_router, ApiConfig, AppState, ChatResponse, SessionTranscript};
use redmine_core::{LlmError, Role};
use redmine_test_utils::{
    answer, assert_tool_pairing, assistant_with_config, assistant_with_script, tool_request,
    AgentConfig, ChatMessage, ScriptStep, ScriptedChatModel,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn router_with(steps: Vec<ScriptStep>) -> (Router, Arc<ScriptedChatModel>) {
    let (svc, model) = assistant_with_script(steps);
    let state = AppState::new(svc, Some("scripted".to_string()));
    (create_api_router(state, &ApiConfig::default()), model)
}

async fn send(router: &Router, request: Request<Body>) -> Result<(StatusCode, Value), String> {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| e.to_string())?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, body))
}

fn post_chat(body: Value) -> Result<Request<Body>, String> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .map_err(|e| e.to_string())
}

#[tokio::test]
async fn test_root_banner() -> Result<(), String> {
    let (router, _) = router_with(Vec::new());
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Redmine Assistant API is running"}));
    Ok(())
}

#[tokio::test]
async fn test_health_reports_model_and_usage() -> Result<(), String> {
    let (router, _) = router_with(Vec::new());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["model"]["model_id"], "scripted");
    assert_eq!(body["details"]["usage"]["requests"], 0);

    let request = Request::builder()
        .uri("/health/ping")
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("pong".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_chat_returns_answer_and_tool_data() -> Result<(), String> {
    let (router, model) = router_with(vec![
        tool_request("call_1", "get_all_projects", json!({})),
        answer("Hay tres proyectos:\n- Project Phoenix\n- Internal Tools\n- Mobile App Q3"),
    ]);

    let (status, body) = send(&router, post_chat(json!({"query": "¿Qué proyectos hay?"}))?).await?;
    assert_eq!(status, StatusCode::OK);

    let reply: ChatResponse = serde_json::from_value(body).map_err(|e| e.to_string())?;
    assert!(!reply.fallback);
    assert!(reply.response.contains("Internal Tools"));
    let calls = reply.tool_calls.ok_or("missing tool_calls")?;
    assert_eq!(calls[0].name, "get_all_projects");
    let results = reply.tool_results.ok_or("missing tool_results")?;
    assert_eq!(results[0].tool_call_id, "call_1");
    assert_eq!(
        results[0].content,
        r#"["Project Phoenix","Internal Tools","Mobile App Q3"]"#
    );
    assert_eq!(model.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_session_continues_and_can_be_read_back() -> Result<(), String> {
    let (router, _) = router_with(vec![answer("Hola"), answer("Adiós")]);

    let (_, body) = send(&router, post_chat(json!({"query": "hola"}))?).await?;
    let session_id = body["session_id"].as_str().ok_or("missing session_id")?.to_string();

    let (status, _) = send(
        &router,
        post_chat(json!({"query": "adiós", "session_id": session_id}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri(format!("/chat/sessions/{}", session_id))
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    let transcript: SessionTranscript = serde_json::from_value(body).map_err(|e| e.to_string())?;
    assert_eq!(transcript.acting_user, "sally");
    assert_eq!(transcript.messages[0].role, Role::System);
    assert_eq!(
        transcript.messages.iter().filter(|m| m.role == Role::User).count(),
        2
    );
    assert_tool_pairing(&transcript.messages);
    Ok(())
}

#[tokio::test]
async fn test_reset_session_clears_history() -> Result<(), String> {
    let (router, _) = router_with(vec![answer("Hola")]);
    let (_, body) = send(&router, post_chat(json!({"query": "hola"}))?).await?;
    let session_id = body["session_id"].as_str().ok_or("missing session_id")?.to_string();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/chat/sessions/{}", session_id))
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reset"], true);

    let request = Request::builder()
        .uri(format!("/chat/sessions/{}", session_id))
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (_, body) = send(&router, request).await?;
    assert_eq!(body["messages"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_not_found() -> Result<(), String> {
    let (router, _) = router_with(Vec::new());
    let request = Request::builder()
        .method("DELETE")
        .uri("/chat/sessions/does-not-exist")
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_model_failure_returns_fallback_with_ok_status() -> Result<(), String> {
    let (router, _) = router_with(vec![ScriptStep::Fail(LlmError::RequestFailed {
        provider: "openai".to_string(),
        status: 503,
        message: "overloaded".to_string(),
    })]);

    let (status, body) = send(&router, post_chat(json!({"query": "hola"}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["response"], AgentConfig::default().fallback_message.as_str());
    assert!(body.get("tool_calls").is_none());
    Ok(())
}

#[tokio::test]
async fn test_slow_turn_returns_fallback_before_request_deadline() -> Result<(), String> {
    let agent_config = AgentConfig {
        model_timeout: Duration::from_millis(500),
        turn_timeout: Duration::from_millis(100),
        ..AgentConfig::default()
    };
    let api_config = ApiConfig {
        request_timeout: Duration::from_secs(5),
        ..ApiConfig::default()
    };
    api_config
        .ensure_outlasts_turn(agent_config.turn_timeout)
        .map_err(|e| e.to_string())?;

    let (svc, _) = assistant_with_config(
        agent_config,
        [
            tool_request("call_1", "get_all_projects", json!({})),
            ScriptStep::Delayed(Duration::from_millis(300), ChatMessage::assistant("done")),
        ],
    );
    let router = create_api_router(AppState::new(svc, None), &api_config);

    let (status, body) = send(&router, post_chat(json!({"query": "proyectos"}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["response"], AgentConfig::default().fallback_message.as_str());
    Ok(())
}

#[tokio::test]
async fn test_request_deadline_shorter_than_turn_is_rejected() {
    let api_config = ApiConfig {
        request_timeout: Duration::from_millis(200),
        ..ApiConfig::default()
    };
    assert!(api_config
        .ensure_outlasts_turn(AgentConfig::default().turn_timeout)
        .is_err());
}

#[tokio::test]
async fn test_malformed_bodies_are_rejected() -> Result<(), String> {
    let (router, model) = router_with(Vec::new());

    let (status, body) = send(&router, post_chat(json!({"query": "   "}))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");

    let (status, body) = send(&router, post_chat(json!({"question": "hola"}))?).await?;
    assert!(status.is_client_error());
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) = send(
        &router,
        post_chat(json!({"query": "hola", "conversation_history": [{"role": "robot", "content": "x"}]}))?,
    )
    .await?;
    assert!(status.is_client_error());
    assert_eq!(model.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_trusted_header_sets_acting_user() -> Result<(), String> {
    let config = AgentConfig {
        trust_user_hint: true,
        ..AgentConfig::default()
    };
    let (svc, model) = assistant_with_config(config, [answer("Hola Dave")]);
    let router = create_api_router(AppState::new(svc, None), &ApiConfig::default());

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("x-redmine-user", "dave")
        .body(Body::from(json!({"query": "mis tareas"}).to_string()))
        .map_err(|e| e.to_string())?;
    let (status, _) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);

    let requests = model.requests();
    let sent = &requests[0].messages;
    assert!(sent[0].is_system());
    assert!(sent[0].content.contains("dave"));
    Ok(())
}

#[tokio::test]
async fn test_openapi_document_served() -> Result<(), String> {
    let (router, _) = router_with(Vec::new());
    let request = Request::builder()
        .uri("/openapi.json")
        .body(Body::empty())
        .map_err(|e| e.to_string())?;
    let (status, body) = send(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/chat").is_some());
    Ok(())
}
