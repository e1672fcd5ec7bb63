//! OpenAI provider implementation
//!
//! Tool-calling chat completions against the `/chat/completions` endpoint.

pub mod chat;
pub mod client;
pub mod types;

pub use chat::OpenAIChatModel;
pub use client::OpenAIClient;
