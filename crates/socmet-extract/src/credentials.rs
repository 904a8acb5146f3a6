//! Session-credential checks backed by Netscape-format cookie jars.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socmet_core::{AppConfig, Platform};

use crate::error::CredentialStatus;
use crate::traits::CredentialPrecondition;

/// One cookie line from a Netscape `cookies.txt` export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarCookie {
    pub domain: String,
    pub name: String,
    pub value: String,
    /// Unix seconds; `0` marks a session cookie.
    pub expires: i64,
}

/// Cookie names a logged-in session needs, per platform. Empty for
/// platforms that are scraped anonymously.
#[must_use]
pub fn required_cookies(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Facebook => &["c_user", "xs"],
        Platform::X => &["auth_token", "ct0"],
        Platform::Instagram | Platform::Tiktok | Platform::Youtube => &[],
    }
}

/// Platforms that cannot be read at all without a logged-in session.
/// Others only need one when they are configured as session platforms.
fn always_session_gated(platform: Platform) -> bool {
    matches!(platform, Platform::X)
}

/// Parses a Netscape cookie jar, skipping comments and malformed lines.
/// Curl's `#HttpOnly_` domain prefix is honored.
#[must_use]
pub fn parse_cookie_jar(contents: &str) -> Vec<JarCookie> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            Some(JarCookie {
                domain: fields[0].to_string(),
                name: fields[5].to_string(),
                value: fields[6].trim().to_string(),
                expires: fields[4].trim().parse().unwrap_or(0),
            })
        })
        .collect()
}

/// Evaluates a jar against the platform's required cookies at `now`.
#[must_use]
pub fn evaluate_jar(platform: Platform, cookies: &[JarCookie], now: DateTime<Utc>) -> CredentialStatus {
    let mut status = CredentialStatus::Ok;
    for name in required_cookies(platform) {
        let Some(cookie) = cookies
            .iter()
            .find(|c| c.name == *name && !c.value.is_empty())
        else {
            return CredentialStatus::Missing;
        };
        if cookie.expires > 0 && cookie.expires <= now.timestamp() {
            status = CredentialStatus::Expired;
        }
    }
    status
}

/// Reads each platform's cookie jar from disk on every check, so rotated
/// credentials are picked up without a restart.
///
/// X is always gated. Facebook is gated only when a jar is configured for
/// it or it is listed as a session platform; otherwise it is scraped
/// anonymously.
#[derive(Debug, Clone, Default)]
pub struct CookieFilePrecondition {
    jars: HashMap<Platform, PathBuf>,
    session_platforms: Vec<Platform>,
}

impl CookieFilePrecondition {
    #[must_use]
    pub fn new(jars: HashMap<Platform, PathBuf>) -> Self {
        Self {
            jars,
            session_platforms: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_session_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.session_platforms = platforms;
        self
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let jars = Platform::ALL
            .iter()
            .filter_map(|p| config.cookies_path(*p).map(|path| (*p, path.to_path_buf())))
            .collect();
        Self::new(jars).with_session_platforms(config.session_platforms.clone())
    }

    fn is_gated(&self, platform: Platform) -> bool {
        !required_cookies(platform).is_empty()
            && (always_session_gated(platform)
                || self.jars.contains_key(&platform)
                || self.session_platforms.contains(&platform))
    }
}

#[async_trait]
impl CredentialPrecondition for CookieFilePrecondition {
    async fn check(&self, platform: Platform) -> CredentialStatus {
        if !self.is_gated(platform) {
            return CredentialStatus::Ok;
        }
        let Some(path) = self.jars.get(&platform) else {
            tracing::warn!(%platform, "no cookie jar configured for session platform");
            return CredentialStatus::Missing;
        };
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(%platform, path = %path.display(), error = %e, "cookie jar unreadable");
                return CredentialStatus::Missing;
            }
        };
        evaluate_jar(platform, &parse_cookie_jar(&contents), Utc::now())
    }
}
