//! Redmine Assistant API - HTTP chat surface
//!
//! Exposes the assistant's conversation turns and session management over
//! REST (Axum), with health checks and an OpenAPI document.

pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, LogFormat, OpenAiConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
