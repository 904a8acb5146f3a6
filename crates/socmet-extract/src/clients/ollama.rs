use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_client, ensure_success, send_error};
use crate::error::ExtractError;
use crate::traits::TextCompletionModel;

const COLLABORATOR: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Text completion through Ollama's non-streaming `/api/generate`.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// `insecure_tls` disables certificate validation for self-signed
    /// model hosts.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, model: &str, insecure_tls: bool) -> Result<Self, ExtractError> {
        Ok(Self {
            client: build_client(insecure_tls)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TextCompletionModel for OllamaClient {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, ExtractError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(COLLABORATOR, timeout, &e))?;
        let response = ensure_success(COLLABORATOR, response).await?;

        let body: GenerateResponse = response.json().await.map_err(|e| ExtractError::Parse {
            context: "ollama generate response".to_string(),
            message: e.to_string(),
        })?;
        Ok(body.response)
    }
}
