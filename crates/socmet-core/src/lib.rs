//! Shared domain types and configuration for the social engagement service.

pub mod app_config;
pub mod config;
pub mod platform;
pub mod wire;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use platform::{ParsePlatformError, Platform};
pub use wire::{
    Comment, CommentPayload, CompletePayload, ErrorPayload, MetricsPayload, MetricsSnapshot,
    ScrapeResponse,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
