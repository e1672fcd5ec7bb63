//! Chat Endpoints
//!
//! - `POST /chat` - Run one conversation turn
//! - `GET /chat/sessions/{id}` - Stored transcript of a session
//! - `DELETE /chat/sessions/{id}` - Clear a session's history

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use redmine_agent::ChatTurn;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{ChatRequest, ChatResponse, ResetResponse, SessionTranscript};

/// Header naming the acting user. Honoured only when the deployment trusts it.
pub const ACTING_USER_HEADER: &str = "x-redmine-user";

fn acting_user_hint(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACTING_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// POST /chat - Answer one question
#[utoipa::path(
    post,
    path = "/chat",
    tag = "Chat",
    request_body = ChatRequest,
    params(
        ("x-redmine-user" = Option<String>, Header, description = "Acting user, when trusted"),
    ),
    responses(
        (status = 200, description = "Answer, or the fallback message on a failed turn", body = ChatResponse),
        (status = 400, description = "Malformed body or empty query", body = ApiError),
    ),
)]
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;

    let mut turn = ChatTurn::new(request.query);
    if let Some(session_id) = request.session_id {
        turn = turn.in_session(session_id);
    }
    if let Some(history) = request.conversation_history {
        turn = turn.with_history(history);
    }
    if let Some(user) = acting_user_hint(&headers) {
        turn = turn.acting_as(user);
    }

    let reply = state.assistant.chat(turn).await?;
    info!(
        session_id = %reply.session_id,
        round_trips = reply.round_trips,
        tool_calls = reply.tool_exchanges.len(),
        fallback = reply.fallback,
        "Chat request completed"
    );
    Ok(Json(reply.into()))
}

/// GET /chat/sessions/{id} - Stored transcript
#[utoipa::path(
    get,
    path = "/chat/sessions/{id}",
    tag = "Chat",
    params(
        ("id" = String, Path, description = "Session id"),
    ),
    responses(
        (status = 200, description = "Session transcript", body = SessionTranscript),
        (status = 404, description = "Unknown session", body = ApiError),
    ),
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionTranscript>> {
    let session = state.assistant.session(&id).await?;
    Ok(Json(session.into()))
}

/// DELETE /chat/sessions/{id} - Clear history, keep the id
#[utoipa::path(
    delete,
    path = "/chat/sessions/{id}",
    tag = "Chat",
    params(
        ("id" = String, Path, description = "Session id"),
    ),
    responses(
        (status = 200, description = "Session cleared", body = ResetResponse),
        (status = 404, description = "Unknown session", body = ApiError),
    ),
)]
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResetResponse>> {
    state.assistant.reset(&id).await?;
    info!(session_id = %id, "Session reset");
    Ok(Json(ResetResponse {
        session_id: id,
        reset: true,
    }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/sessions/:id", get(get_session).delete(reset_session))
        .with_state(state)
}
