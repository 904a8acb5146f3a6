use socmet_core::Platform;
use socmet_extract::ExtractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("no extractor registered for {0}")]
    UnsupportedPlatform(Platform),

    #[error("failed to open {platform} page: {message}")]
    Page { platform: Platform, message: String },

    #[error("{platform} comment source failed: {message}")]
    Comments { platform: Platform, message: String },
}
