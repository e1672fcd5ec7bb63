//! Redmine Assistant API Server Entry Point
//!
//! Bootstraps configuration, the seed dataset and the model provider, then
//! starts the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use redmine_agent::{AgentConfig, AssistantService, Dataset};
use redmine_api::telemetry::init_tracing;
use redmine_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, OpenAiConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let api_config = ApiConfig::from_env()?;
    init_tracing(api_config.log_format)?;

    let agent_config = AgentConfig::from_env()?;
    api_config.ensure_outlasts_turn(agent_config.turn_timeout)?;
    let openai_config = OpenAiConfig::from_env()?;

    let providers = openai_config.provider_registry();
    let model_id = providers.chat().ok().map(|m| m.model_id().to_string());
    match &model_id {
        Some(model) => tracing::info!(%model, "Chat model configured"),
        None => tracing::warn!("OPENAI_API_KEY is not set; every chat turn will return the fallback message"),
    }

    let dataset = Dataset::seed();
    dataset
        .validate()
        .map_err(|e| ApiError::internal_error(format!("Seed dataset is inconsistent: {}", e)))?;

    let assistant = AssistantService::new(&agent_config, providers, Arc::new(dataset));
    let state = AppState::new(assistant, model_id);
    let app: Router = create_api_router(state, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting Redmine Assistant API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
