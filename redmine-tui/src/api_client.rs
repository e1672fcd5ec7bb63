//! REST client for the assistant's HTTP surface.

use crate::config::TuiConfig;
use redmine_api::error::ApiError as ApiServerError;
use redmine_api::routes::chat::ACTING_USER_HEADER;
use redmine_api::types::{ChatRequest, ChatResponse, ResetResponse};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let mut headers = HeaderMap::new();
        if let Some(user) = &config.acting_user {
            let value = HeaderValue::from_str(user.trim())
                .map_err(|e| ApiClientError::Config(format!("invalid acting_user: {}", e)))?;
            headers.insert(ACTING_USER_HEADER, value);
        }

        Ok(Self {
            client,
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiClientError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn reset_session(&self, session_id: &str) -> Result<ResetResponse, ApiClientError> {
        let response = self
            .client
            .delete(format!("{}/chat/sessions/{}", self.base_url, session_id))
            .headers(self.headers.clone())
            .send()
            .await?;
        parse_response(response).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiClientError> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&text)?);
    }
    Err(ApiClientError::InvalidResponse(describe_error(status.as_u16(), &text)))
}

/// Human-readable summary of an error body.
pub fn describe_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiServerError>(body) {
        Ok(api_error) => format!("{}: {}", api_error.code, api_error.message),
        Err(_) => format!("HTTP {}: {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;

    fn config(acting_user: Option<&str>) -> TuiConfig {
        TuiConfig {
            api_base_url: "http://localhost:8080/".to_string(),
            request_timeout_ms: 1_000,
            acting_user: acting_user.map(str::to_string),
            show_tool_calls: false,
            theme: ThemeConfig {
                name: "synthbrute".to_string(),
            },
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(&config(None)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert!(client.headers.is_empty());
    }

    #[test]
    fn test_acting_user_header_set() {
        let client = ApiClient::new(&config(Some("dave"))).unwrap();
        assert_eq!(client.headers.get(ACTING_USER_HEADER).unwrap(), "dave");
    }

    #[test]
    fn test_describe_structured_error() {
        let body = r#"{"code":"SESSION_NOT_FOUND","message":"Session abc not found"}"#;
        assert_eq!(describe_error(404, body), "SessionNotFound: Session abc not found");
        assert_eq!(describe_error(502, "bad gateway"), "HTTP 502: bad gateway");
    }
}
