use crate::app_config::{AppConfig, Environment};
use crate::{ConfigError, Platform};

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it from a
/// `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> bool {
        lookup(var).map_or(default, |raw| parse_flag(&raw, default))
    };

    let env = parse_environment(&or_default("SOCMET_ENV", "development"));

    let bind_addr = or_default("SOCMET_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SOCMET_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("SOCMET_LOG_LEVEL", "info");
    let max_comments = parse_usize("SOCMET_MAX_COMMENTS", "20")?;

    let text_model_url = trim_base_url(&or_default(
        "SOCMET_TEXT_MODEL_URL",
        "http://localhost:11434",
    ));
    let text_model = or_default("SOCMET_TEXT_MODEL", "qwen3:30b");
    let text_model_timeout_ms = parse_u64("SOCMET_TEXT_MODEL_TIMEOUT_MS", "60000")?;
    let text_model_insecure_tls = parse_bool("SOCMET_TEXT_MODEL_INSECURE_TLS", false);
    let text_model_max_chars = parse_usize("SOCMET_TEXT_MODEL_MAX_CHARS", "12000")?;

    let vision_model_url = or_default(
        "SOCMET_VISION_MODEL_URL",
        "http://localhost:8080/v1/chat/completions",
    );
    let vision_model = or_default("SOCMET_VISION_MODEL", "qwen3-vl-30b");
    let vision_model_token = optional("SOCMET_VISION_MODEL_TOKEN");
    let vision_timeout_ms = parse_u64("SOCMET_VISION_TIMEOUT_MS", "120000")?;
    let vision_scroll = parse_bool("SOCMET_VISION_SCROLL", false);

    let browserless_url = trim_base_url(&or_default(
        "SOCMET_BROWSERLESS_URL",
        "http://localhost:3000",
    ));
    let browserless_token = optional("SOCMET_BROWSERLESS_TOKEN");
    let page_timeout_ms = parse_u64("SOCMET_PAGE_TIMEOUT_MS", "90000")?;

    let session_platforms = parse_platform_list(&or_default("SOCMET_SESSION_PLATFORMS", ""))
        .map_err(|reason| invalid("SOCMET_SESSION_PLATFORMS", reason))?;
    let facebook_cookies_path = optional("SOCMET_FACEBOOK_COOKIES_PATH").map(PathBuf::from);
    let x_cookies_path = optional("SOCMET_X_COOKIES_PATH").map(PathBuf::from);

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        max_comments,
        text_model_url,
        text_model,
        text_model_timeout_ms,
        text_model_insecure_tls,
        text_model_max_chars,
        vision_model_url,
        vision_model,
        vision_model_token,
        vision_timeout_ms,
        vision_scroll,
        browserless_url,
        browserless_token,
        page_timeout_ms,
        session_platforms,
        facebook_cookies_path,
        x_cookies_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_flag(raw: &str, default: bool) -> bool {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() {
        return default;
    }
    matches!(value.as_str(), "1" | "true" | "yes" | "on")
}

fn trim_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_platform_list(raw: &str) -> Result<Vec<Platform>, String> {
    let mut platforms = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let platform = item.parse::<Platform>().map_err(|e| e.to_string())?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    Ok(platforms)
}
