use std::net::SocketAddr;
use std::path::PathBuf;

use crate::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub max_comments: usize,
    pub text_model_url: String,
    pub text_model: String,
    pub text_model_timeout_ms: u64,
    pub text_model_insecure_tls: bool,
    pub text_model_max_chars: usize,
    pub vision_model_url: String,
    pub vision_model: String,
    pub vision_model_token: Option<String>,
    pub vision_timeout_ms: u64,
    pub vision_scroll: bool,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub page_timeout_ms: u64,
    /// Platforms whose content is only reachable through an authenticated
    /// browser session; these skip straight to screenshot extraction.
    pub session_platforms: Vec<Platform>,
    pub facebook_cookies_path: Option<PathBuf>,
    pub x_cookies_path: Option<PathBuf>,
}

impl AppConfig {
    /// Cookie jar configured for `platform`, if any.
    #[must_use]
    pub fn cookies_path(&self, platform: Platform) -> Option<&PathBuf> {
        match platform {
            Platform::Facebook => self.facebook_cookies_path.as_ref(),
            Platform::X => self.x_cookies_path.as_ref(),
            Platform::Instagram | Platform::Tiktok | Platform::Youtube => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("max_comments", &self.max_comments)
            .field("text_model_url", &self.text_model_url)
            .field("text_model", &self.text_model)
            .field("text_model_timeout_ms", &self.text_model_timeout_ms)
            .field("text_model_insecure_tls", &self.text_model_insecure_tls)
            .field("text_model_max_chars", &self.text_model_max_chars)
            .field("vision_model_url", &self.vision_model_url)
            .field("vision_model", &self.vision_model)
            .field(
                "vision_model_token",
                &self.vision_model_token.as_ref().map(|_| "[redacted]"),
            )
            .field("vision_timeout_ms", &self.vision_timeout_ms)
            .field("vision_scroll", &self.vision_scroll)
            .field("browserless_url", &self.browserless_url)
            .field(
                "browserless_token",
                &self.browserless_token.as_ref().map(|_| "[redacted]"),
            )
            .field("page_timeout_ms", &self.page_timeout_ms)
            .field("session_platforms", &self.session_platforms)
            .field("facebook_cookies_path", &self.facebook_cookies_path)
            .field("x_cookies_path", &self.x_cookies_path)
            .finish()
    }
}
