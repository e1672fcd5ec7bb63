//! Redmine assistant terminal client library exports.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod keys;
pub mod notifications;
pub mod state;
pub mod theme;
pub mod view;
