//! OpenAPI document for the Redmine Assistant API, generated with utoipa
//! from the route annotations.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{chat, health};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus, UsageReport};
use crate::types::{
    ChatRequest, ChatResponse, ResetResponse, RootResponse, SessionTranscript, ToolResultView,
};
use redmine_core::{ChatMessage, Role, ToolCall};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Redmine Assistant API",
        description = "Conversational assistant answering questions about Redmine users, projects and issues"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Health", description = "Liveness and status"),
        (name = "Chat", description = "Conversation turns and session management")
    ),
    paths(
        health::root,
        health::health,
        health::ping,
        health::liveness,
        chat::chat,
        chat::get_session,
        chat::reset_session,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        ChatRequest,
        ChatResponse,
        ToolResultView,
        SessionTranscript,
        ResetResponse,
        RootResponse,
        HealthResponse,
        HealthStatus,
        HealthDetails,
        ComponentHealth,
        UsageReport,
        ChatMessage,
        ToolCall,
        Role,
    ))
)]
pub struct ApiDoc;
