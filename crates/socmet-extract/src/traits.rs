//! Seams to the external collaborators of the fallback chain.
//!
//! Concrete HTTP-backed implementations live in [`crate::clients`] and
//! [`crate::credentials`]; tests substitute in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use socmet_core::Platform;

use crate::error::{CredentialStatus, ExtractError};

/// Turns rendered markup into plain text.
pub trait TextCleaner: Send + Sync {
    fn clean(&self, html: &str) -> String;
}

/// A prompt-in, text-out language model.
#[async_trait]
pub trait TextCompletionModel: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExtractError::Transport`] when the model cannot be reached,
    /// answers with a non-success status, or exceeds `timeout`.
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, ExtractError>;
}

/// A model that answers a prompt about an image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// `image` is PNG-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Transport`] on network failure or timeout.
    async fn describe(
        &self,
        image: &[u8],
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub full_page: bool,
    /// Scroll to the bottom before capturing so lazy content renders.
    pub scroll_to_bottom: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            full_page: true,
            scroll_to_bottom: false,
        }
    }
}

/// Renders a URL to a PNG screenshot.
#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExtractError::Transport`] if the page cannot be rendered.
    async fn capture(&self, url: &str, options: &CaptureOptions) -> Result<Vec<u8>, ExtractError>;
}

/// Reports whether session credentials for a platform are usable.
#[async_trait]
pub trait CredentialPrecondition: Send + Sync {
    async fn check(&self, platform: Platform) -> CredentialStatus;
}
