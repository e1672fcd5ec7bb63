//! API Configuration Module
//!
//! Server, CORS and model-provider settings, loaded from environment
//! variables with defaults suitable for local development.

use redmine_core::ConfigError;
use redmine_llm::providers::openai::chat::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use redmine_llm::providers::{OpenAIChatModel, OpenAIClient};
use redmine_llm::ProviderRegistry;
use secrecy::SecretString;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means allow all origins.
    pub cors_origins: Vec<String>,
    /// Whole-request deadline. Must outlast the assistant's turn deadline.
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(120),
            log_format: LogFormat::Json,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REDMINE_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT`, then `REDMINE_API_PORT`: Listen port (default: 8080)
    /// - `REDMINE_CORS_ORIGINS`: Comma-separated allowed origins (default: any)
    /// - `REDMINE_REQUEST_TIMEOUT_SECS`: Request deadline (default: 120)
    /// - `REDMINE_LOG_FORMAT`: `json` or `pretty` (default: json)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT").or_else(|| get("REDMINE_API_PORT")) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "port".to_string(),
                value: raw.clone(),
                reason: "expected a port number".to_string(),
            })?,
            None => defaults.port,
        };

        let cors_origins = get("REDMINE_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let request_timeout = match get("REDMINE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "REDMINE_REQUEST_TIMEOUT_SECS".to_string(),
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    })
                }
            },
            None => defaults.request_timeout,
        };

        let log_format = match get("REDMINE_LOG_FORMAT").map(|s| s.to_lowercase()).as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: "REDMINE_LOG_FORMAT".to_string(),
                    value: other.to_string(),
                    reason: "expected json or pretty".to_string(),
                })
            }
        };

        Ok(Self {
            bind_host: get("REDMINE_API_BIND").unwrap_or(defaults.bind_host),
            port,
            cors_origins,
            request_timeout,
            log_format,
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "bind address".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }

    /// Reject a request deadline that could cut a chat turn short, since an
    /// expired request answers with an empty status instead of the fallback.
    pub fn ensure_outlasts_turn(&self, turn_timeout: Duration) -> Result<(), ConfigError> {
        if self.request_timeout <= turn_timeout {
            return Err(ConfigError::InvalidValue {
                field: "REDMINE_REQUEST_TIMEOUT_SECS".to_string(),
                value: self.request_timeout.as_secs().to_string(),
                reason: format!(
                    "must exceed the turn deadline of {}s",
                    turn_timeout.as_secs()
                ),
            });
        }
        Ok(())
    }

    /// Check if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty()
    }
}

// ============================================================================
// MODEL PROVIDER CONFIGURATION
// ============================================================================

/// OpenAI provider settings.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Absent key means no provider is registered
    pub api_key: Option<SecretString>,
    pub model: String,
    pub max_tokens: i32,
    pub base_url: Option<String>,
    pub requests_per_minute: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: None,
            requests_per_minute: 60,
        }
    }
}

impl OpenAiConfig {
    /// Load provider settings from environment variables.
    ///
    /// Environment variables:
    /// - `OPENAI_API_KEY`: API key (no default; absent disables the model)
    /// - `REDMINE_MODEL`: Model name (default: gpt-4.1)
    /// - `REDMINE_MAX_TOKENS`: Completion token limit (default: 1000)
    /// - `OPENAI_BASE_URL`: OpenAI-compatible endpoint override
    /// - `REDMINE_OPENAI_RPM`: Requests per minute (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let max_tokens = match get("REDMINE_MAX_TOKENS") {
            Some(raw) => raw.parse::<i32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: "REDMINE_MAX_TOKENS".to_string(),
                    value: raw.clone(),
                    reason: "expected a positive integer".to_string(),
                }
            })?,
            None => defaults.max_tokens,
        };
        let requests_per_minute = match get("REDMINE_OPENAI_RPM") {
            Some(raw) => raw.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                field: "REDMINE_OPENAI_RPM".to_string(),
                value: raw.clone(),
                reason: "expected a positive integer".to_string(),
            })?,
            None => defaults.requests_per_minute,
        };

        Ok(Self {
            api_key: get("OPENAI_API_KEY").map(SecretString::from),
            model: get("REDMINE_MODEL").unwrap_or(defaults.model),
            max_tokens,
            base_url: get("OPENAI_BASE_URL"),
            requests_per_minute,
        })
    }

    /// Registry holding the configured chat model, or nothing without a key.
    pub fn provider_registry(&self) -> ProviderRegistry {
        let Some(api_key) = self.api_key.clone() else {
            return ProviderRegistry::new();
        };

        let mut client = OpenAIClient::new(api_key, self.requests_per_minute);
        if let Some(base_url) = &self.base_url {
            client = client.with_base_url(base_url.clone());
        }
        let model = OpenAIChatModel::with_client(client, self.model.clone())
            .with_max_tokens(self.max_tokens);
        ProviderRegistry::with_chat(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.port, 8080);
        assert!(config.allows_any_origin());
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_port_prefers_platform_variable() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("REDMINE_API_PORT", "9001"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);

        let config = ApiConfig::from_lookup(lookup(&[("REDMINE_API_PORT", "9001")])).unwrap();
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn test_cors_origins_and_format() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("REDMINE_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("REDMINE_LOG_FORMAT", "Pretty"),
        ]))
        .unwrap();
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ApiConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("REDMINE_LOG_FORMAT", "xml")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("REDMINE_REQUEST_TIMEOUT_SECS", "0")])).is_err());
        let config = ApiConfig {
            bind_host: "not a host".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_request_deadline_must_outlast_turn() {
        let config = ApiConfig::default();
        assert!(config.ensure_outlasts_turn(Duration::from_secs(90)).is_ok());

        let err = config
            .ensure_outlasts_turn(Duration::from_secs(120))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "REDMINE_REQUEST_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_openai_config_without_key_registers_nothing() {
        let config = OpenAiConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "gpt-4.1");
        assert!(!config.provider_registry().has_chat());
    }

    #[test]
    fn test_openai_config_with_key_registers_model() {
        let config = OpenAiConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("REDMINE_MODEL", "gpt-4.1-mini"),
            ("OPENAI_BASE_URL", "http://localhost:1234/v1"),
        ]))
        .unwrap();
        let registry = config.provider_registry();
        assert_eq!(registry.chat().unwrap().model_id(), "gpt-4.1-mini");
        assert!(!format!("{:?}", config).contains("sk-test"));
    }
}
