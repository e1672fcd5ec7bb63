//! Acting-user resolution.
//!
//! The acting user is supplied out of band by the calling surface. How much
//! of the caller's claim to trust is a deployment decision.

use std::fmt::Debug;

/// Decides who the acting user of a chat turn is.
pub trait ActingUserProvider: Send + Sync + Debug {
    /// `hint` is whatever the calling surface claims, if anything.
    fn acting_user(&self, hint: Option<&str>) -> String;
}

/// Always the same user, whatever the caller claims.
#[derive(Debug, Clone)]
pub struct FixedActingUser {
    username: String,
}

impl FixedActingUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl ActingUserProvider for FixedActingUser {
    fn acting_user(&self, _hint: Option<&str>) -> String {
        self.username.clone()
    }
}

/// Takes the caller's claim at face value, falling back to a default.
#[derive(Debug, Clone)]
pub struct TrustedHintActingUser {
    default: String,
}

impl TrustedHintActingUser {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
        }
    }
}

impl ActingUserProvider for TrustedHintActingUser {
    fn acting_user(&self, hint: Option<&str>) -> String {
        hint.map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default.clone())
    }
}
