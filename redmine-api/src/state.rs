//! Shared application state for route handlers.

use redmine_agent::AssistantService;
use std::sync::Arc;
use std::time::Instant;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<AssistantService>,
    /// Id of the configured chat model, if any
    pub model_id: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(assistant: AssistantService, model_id: Option<String>) -> Self {
        Self {
            assistant: Arc::new(assistant),
            model_id,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
