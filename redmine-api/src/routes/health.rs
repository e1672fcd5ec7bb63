//! Health Check Endpoints
//!
//! - `/` - Banner
//! - `/health` - Service status with model and usage details
//! - `/health/ping` - Simple liveness check
//! - `/health/live` - Process alive check

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;
use crate::types::RootResponse;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthDetails {
    pub model: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
    /// Sessions currently held in memory
    pub sessions: usize,
    pub usage: UsageReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Cumulative model usage since startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UsageReport {
    pub requests: i64,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET / - Service banner
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = RootResponse),
    ),
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Redmine Assistant API is running".to_string(),
    })
}

/// GET /health - Service status
///
/// Always answers `healthy` while the process serves requests; a missing
/// model shows up as a degraded component.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse),
    ),
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let model = match &state.model_id {
        Some(id) => ComponentHealth {
            status: HealthStatus::Healthy,
            model_id: Some(id.clone()),
            error: None,
        },
        None => ComponentHealth {
            status: HealthStatus::Degraded,
            model_id: None,
            error: Some("OPENAI_API_KEY is not set; replies use the fallback message".to_string()),
        },
    };

    let usage = state.assistant.usage();
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: None,
        details: Some(HealthDetails {
            model,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.uptime_seconds(),
            sessions: state.assistant.session_count(),
            usage: UsageReport {
                requests: usage.requests(),
                prompt_tokens: usage.prompt_tokens(),
                completion_tokens: usage.completion_tokens(),
            },
        }),
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ping - Simple pong response
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
)]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse),
    ),
)]
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router (no auth required)
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ping", get(ping))
        .route("/health/live", get(liveness))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            message: Some("All systems operational".to_string()),
            details: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_degraded_component_serialization() {
        let component = ComponentHealth {
            status: HealthStatus::Degraded,
            model_id: None,
            error: Some("no key".to_string()),
        };

        let json = serde_json::to_string(&component).unwrap();
        assert!(json.contains("\"status\":\"degraded\""));
        assert!(!json.contains("model_id"));
    }
}
