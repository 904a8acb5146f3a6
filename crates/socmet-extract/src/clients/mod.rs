//! HTTP-backed implementations of the collaborator traits.

mod browserless;
mod chat_vision;
mod ollama;

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::ExtractError;

pub use browserless::BrowserlessClient;
pub use chat_vision::ChatVisionClient;
pub use ollama::OllamaClient;

const USER_AGENT: &str = concat!("socmet/", env!("CARGO_PKG_VERSION"));

fn build_client(insecure_tls: bool) -> Result<Client, ExtractError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(insecure_tls)
        .build()?;
    Ok(client)
}

/// Maps a send failure to a transport error, naming timeouts explicitly.
fn send_error(collaborator: &'static str, timeout: Duration, err: &reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::transport(
            collaborator,
            format!("timed out after {} ms", timeout.as_millis()),
        )
    } else {
        ExtractError::transport(collaborator, err)
    }
}

/// Turns a non-2xx response into a transport error carrying the body.
async fn ensure_success(
    collaborator: &'static str,
    response: Response,
) -> Result<Response, ExtractError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    Err(ExtractError::transport(
        collaborator,
        if body.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            format!("HTTP {}: {body}", status.as_u16())
        },
    ))
}
