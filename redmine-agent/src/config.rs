//! Agent configuration.

use crate::identity::{ActingUserProvider, FixedActingUser, TrustedHintActingUser};
use crate::prompt::DEFAULT_REPLY_LANGUAGE;
use redmine_core::ConfigError;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_ROUND_TRIPS: u32 = 8;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_ACTING_USER: &str = "sally";
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Lo siento, no pude procesar tu solicitud en este momento. Por favor, inténtalo de nuevo.";
/// Answer used when the model ends a turn with empty content.
pub const NO_ANSWER_MESSAGE: &str = "No hay respuesta disponible";

/// Conversation loop and session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Model calls allowed per turn before giving up
    pub max_round_trips: u32,
    /// Deadline for a single model call
    pub model_timeout: Duration,
    /// Deadline for a whole turn, tool rounds included
    pub turn_timeout: Duration,
    /// Acting user when the caller supplies none (or is not trusted)
    pub default_user: String,
    /// Honour the acting user claimed by the calling surface
    pub trust_user_hint: bool,
    pub reply_language: String,
    pub fallback_message: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            turn_timeout: Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS),
            default_user: DEFAULT_ACTING_USER.to_string(),
            trust_user_hint: false,
            reply_language: DEFAULT_REPLY_LANGUAGE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REDMINE_MAX_ROUND_TRIPS`: Model calls per turn (default: 8)
    /// - `REDMINE_MODEL_TIMEOUT_SECS`: Per-call model deadline (default: 60)
    /// - `REDMINE_TURN_TIMEOUT_SECS`: Deadline for a whole turn (default: 90)
    /// - `REDMINE_DEFAULT_USER`: Default acting user (default: sally)
    /// - `REDMINE_TRUST_USER_HEADER`: Trust the caller's acting user (default: false)
    /// - `REDMINE_REPLY_LANGUAGE`: Reply language (default: Spanish)
    /// - `REDMINE_FALLBACK_MESSAGE`: Text returned when a turn fails
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let max_round_trips = match get("REDMINE_MAX_ROUND_TRIPS") {
            Some(raw) => parse_number("REDMINE_MAX_ROUND_TRIPS", &raw)?,
            None => defaults.max_round_trips,
        };
        let model_timeout = match get("REDMINE_MODEL_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("REDMINE_MODEL_TIMEOUT_SECS", &raw)?),
            None => defaults.model_timeout,
        };
        let turn_timeout = match get("REDMINE_TURN_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("REDMINE_TURN_TIMEOUT_SECS", &raw)?),
            None => defaults.turn_timeout,
        };
        let trust_user_hint = get("REDMINE_TRUST_USER_HEADER")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.trust_user_hint);

        let config = Self {
            max_round_trips,
            model_timeout,
            turn_timeout,
            default_user: get("REDMINE_DEFAULT_USER").unwrap_or(defaults.default_user),
            trust_user_hint,
            reply_language: get("REDMINE_REPLY_LANGUAGE").unwrap_or(defaults.reply_language),
            fallback_message: get("REDMINE_FALLBACK_MESSAGE").unwrap_or(defaults.fallback_message),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_round_trips == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_round_trips".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.model_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "model_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.turn_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "turn_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.default_user.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "default_user".to_string(),
            });
        }
        Ok(())
    }

    /// Acting-user policy implied by this configuration.
    pub fn acting_user_provider(&self) -> Arc<dyn ActingUserProvider> {
        if self.trust_user_hint {
            Arc::new(TrustedHintActingUser::new(self.default_user.clone()))
        } else {
            Arc::new(FixedActingUser::new(self.default_user.clone()))
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}
