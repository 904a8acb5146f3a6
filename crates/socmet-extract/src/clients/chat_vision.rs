use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{build_client, ensure_success, send_error};
use crate::error::ExtractError;
use crate::traits::VisionModel;

const COLLABORATOR: &str = "vision-model";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<MessageContent>,
}

/// Servers answer either with a plain string or with typed content parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> String {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        match content {
            Some(MessageContent::Text(text)) => text,
            Some(MessageContent::Parts(parts)) => parts
                .into_iter()
                .find(|p| p.kind == "text")
                .and_then(|p| p.text)
                .unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Vision model behind an OpenAI-compatible chat-completions endpoint.
///
/// The screenshot travels inline as a base64 `data:` URL.
pub struct ChatVisionClient {
    client: Client,
    endpoint: String,
    model: String,
    token: Option<String>,
}

impl ChatVisionClient {
    /// `endpoint` is the full chat-completions URL.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str, model: &str, token: Option<&str>) -> Result<Self, ExtractError> {
        Ok(Self {
            client: build_client(false)?,
            endpoint: endpoint.trim().to_string(),
            model: model.to_string(),
            token: token.map(|t| t.trim().to_string()),
        })
    }
}

#[async_trait]
impl VisionModel for ChatVisionClient {
    async fn describe(
        &self,
        image: &[u8],
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ExtractError> {
        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(image)
        );
        let payload = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "image_url", "image_url": { "url": data_url } },
                    { "type": "text", "text": prompt },
                ],
            }],
        });

        let mut request = self.client.post(&self.endpoint).timeout(timeout).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| send_error(COLLABORATOR, timeout, &e))?;
        let response = ensure_success(COLLABORATOR, response).await?;

        let body: ChatResponse = response.json().await.map_err(|e| ExtractError::Parse {
            context: "chat completion response".to_string(),
            message: e.to_string(),
        })?;
        Ok(body.into_text())
    }
}
