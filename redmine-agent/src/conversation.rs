//! Tool-calling conversation loop.
//!
//! ```text
//!            +-----------+  tool calls   +-----------------+
//!  start --> | Deciding  | ------------> | Executing Tools |
//!            +-----------+ <------------ +-----------------+
//!                  | plain answer
//!                  v
//!             [Answered]
//! ```
//!
//! Each Deciding step is one model call and counts as one round trip.
//! Tool calls of one assistant turn run sequentially, in the order the
//! model listed them, and their results are appended in that order.

use crate::config::NO_ANSWER_MESSAGE;
use crate::dataset::Dataset;
use crate::registry::ToolRegistry;
use redmine_core::{AgentError, AssistantResult, ChatMessage, LlmError, ToolExchange};
use redmine_llm::{ChatCompletion, ChatRequest, ProviderRegistry, TokenUsage, UsageTracker};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What one completed turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final answer text, never empty
    pub answer: String,
    /// The input history plus every message added during the turn
    pub transcript: Vec<ChatMessage>,
    /// Tool calls of the turn paired with their results, in order
    pub exchanges: Vec<ToolExchange>,
    /// Calls answered with an error payload (unknown tool, bad arguments)
    pub rejected_calls: usize,
    pub round_trips: u32,
    pub usage: TokenUsage,
}

enum LoopState {
    Deciding,
    ExecutingTools(ChatMessage),
    Answered(ChatMessage),
}

/// Drives the model and the lookup tools until the model answers.
#[derive(Debug, Clone)]
pub struct ConversationLoop {
    providers: ProviderRegistry,
    tools: ToolRegistry,
    dataset: Arc<Dataset>,
    usage: Arc<UsageTracker>,
    max_round_trips: u32,
    model_timeout: Duration,
}

impl ConversationLoop {
    pub fn new(
        providers: ProviderRegistry,
        tools: ToolRegistry,
        dataset: Arc<Dataset>,
        max_round_trips: u32,
        model_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            tools,
            dataset,
            usage: Arc::new(UsageTracker::new()),
            max_round_trips,
            model_timeout,
        }
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Run one turn over `history`, which must already hold the system
    /// message and the new user message.
    ///
    /// # Errors
    /// * `LlmError` - the model call failed, timed out or was not configured
    /// * `AgentError::RoundTripLimitExceeded` - the model kept asking for tools
    pub async fn run(&self, history: Vec<ChatMessage>) -> AssistantResult<TurnOutcome> {
        let mut transcript = history;
        let mut exchanges = Vec::new();
        let mut rejected_calls = 0usize;
        let mut usage = TokenUsage::default();
        let mut round_trips = 0u32;
        let mut state = LoopState::Deciding;

        loop {
            state = match state {
                LoopState::Deciding => {
                    if round_trips >= self.max_round_trips {
                        return Err(AgentError::RoundTripLimitExceeded {
                            limit: self.max_round_trips,
                        }
                        .into());
                    }
                    round_trips += 1;

                    let completion = self.decide(&transcript).await?;
                    if let Some(reported) = completion.usage {
                        usage.add(reported);
                    }

                    if completion.message.requests_tools() {
                        LoopState::ExecutingTools(completion.message)
                    } else {
                        LoopState::Answered(completion.message)
                    }
                }
                LoopState::ExecutingTools(request) => {
                    debug!(
                        round_trip = round_trips,
                        calls = request.tool_calls.len(),
                        "Executing tool calls"
                    );
                    let results: Vec<ChatMessage> = request
                        .tool_calls
                        .iter()
                        .map(|call| {
                            let outcome = self.tools.execute(&self.dataset, call);
                            if outcome.is_error {
                                rejected_calls += 1;
                            }
                            exchanges.push(ToolExchange {
                                call: call.clone(),
                                result: outcome.content.clone(),
                            });
                            ChatMessage::tool(call.id.clone(), outcome.content)
                        })
                        .collect();

                    transcript.push(request);
                    transcript.extend(results);
                    LoopState::Deciding
                }
                LoopState::Answered(message) => {
                    let answer = if message.content.trim().is_empty() {
                        NO_ANSWER_MESSAGE.to_string()
                    } else {
                        message.content.clone()
                    };
                    transcript.push(message);
                    info!(
                        round_trips,
                        tool_calls = exchanges.len(),
                        rejected_calls,
                        "Turn answered"
                    );

                    return Ok(TurnOutcome {
                        answer,
                        transcript,
                        exchanges,
                        rejected_calls,
                        round_trips,
                        usage,
                    });
                }
            };
        }
    }

    /// One model call, bounded by the configured timeout.
    async fn decide(&self, transcript: &[ChatMessage]) -> AssistantResult<ChatCompletion> {
        let model = self.providers.chat()?;
        let request = ChatRequest {
            messages: transcript.to_vec(),
            tools: self.tools.specs(),
        };

        let completion = tokio::time::timeout(self.model_timeout, model.complete(&request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: model.model_id().to_string(),
                timeout_ms: self.model_timeout.as_millis() as u64,
            })??;

        self.usage.record(completion.usage);
        Ok(completion)
    }
}
