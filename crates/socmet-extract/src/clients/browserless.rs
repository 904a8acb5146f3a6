use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{build_client, ensure_success, send_error};
use crate::error::ExtractError;
use crate::traits::{CaptureOptions, ScreenshotCapture};

const COLLABORATOR: &str = "browserless";

/// Headless-browser rendering through a Browserless instance.
pub struct BrowserlessClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl BrowserlessClient {
    /// `timeout` bounds each render round trip.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self, ExtractError> {
        Ok(Self {
            client: build_client(false)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            timeout,
        })
    }

    /// POST to `route`, with the API token as a percent-encoded query pair.
    fn post(&self, route: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(format!("{}/{route}", self.base_url));
        match &self.token {
            Some(token) => request.query(&[("token", token.as_str())]),
            None => request,
        }
    }

    /// Fetches the fully rendered HTML of `url` via `/content`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Transport`] on network failure, timeout or a
    /// non-success status.
    pub async fn content(&self, url: &str) -> Result<String, ExtractError> {
        let body = json!({
            "url": url,
            "gotoOptions": { "waitUntil": "networkidle2" },
        });
        let response = self
            .post("content")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(COLLABORATOR, self.timeout, &e))?;
        let response = ensure_success(COLLABORATOR, response).await?;
        response
            .text()
            .await
            .map_err(|e| ExtractError::transport(COLLABORATOR, e))
    }
}

#[async_trait]
impl ScreenshotCapture for BrowserlessClient {
    async fn capture(&self, url: &str, options: &CaptureOptions) -> Result<Vec<u8>, ExtractError> {
        let body = json!({
            "url": url,
            "options": { "fullPage": options.full_page, "type": "png" },
            "gotoOptions": { "waitUntil": "networkidle2" },
            "scrollPage": options.scroll_to_bottom,
        });
        let response = self
            .post("screenshot")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(COLLABORATOR, self.timeout, &e))?;
        let response = ensure_success(COLLABORATOR, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractError::transport(COLLABORATOR, e))?;
        if bytes.is_empty() {
            return Err(ExtractError::transport(COLLABORATOR, "empty screenshot"));
        }
        Ok(bytes.to_vec())
    }
}
