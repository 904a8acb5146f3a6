//! Per-platform page access behind one contract.
//!
//! Each platform is an interchangeable [`PlatformExtractor`]; the registry
//! maps a [`Platform`] to its implementation so nothing downstream branches
//! on the platform.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use socmet_core::{Comment, MetricsSnapshot, Platform};
use socmet_extract::clean::extract_title;
use socmet_extract::{BrowserlessClient, TextCleaner};

use crate::error::SessionError;

/// Comments in discovery order, pulled one at a time.
pub type CommentStream = BoxStream<'static, Result<Comment, SessionError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Upper bound on comments a session delivers.
    pub max_comments: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { max_comments: 20 }
    }
}

/// What a platform extractor learned from opening a URL.
pub struct PlatformPage {
    /// Identity fields plus any counts the platform exposes natively.
    pub snapshot: MetricsSnapshot,
    /// Cleaned visible text for the text-based strategies.
    pub body_text: Option<String>,
    pub comments: CommentStream,
}

impl PlatformPage {
    #[must_use]
    pub fn without_comments(snapshot: MetricsSnapshot, body_text: Option<String>) -> Self {
        Self {
            snapshot,
            body_text,
            comments: stream::empty().boxed(),
        }
    }
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SessionError::Page`] when the page cannot be opened at all.
    async fn open(&self, url: &str, options: &ExtractOptions) -> Result<PlatformPage, SessionError>;
}

#[derive(Clone, Default)]
pub struct PlatformRegistry {
    extractors: HashMap<Platform, Arc<dyn PlatformExtractor>>,
}

impl PlatformRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rendered-page extractor for every platform.
    #[must_use]
    pub fn rendered(renderer: Arc<BrowserlessClient>, cleaner: Arc<dyn TextCleaner>) -> Self {
        Platform::ALL
            .iter()
            .fold(Self::new(), |registry, platform| {
                registry.with(
                    *platform,
                    Arc::new(RenderedPageExtractor::new(
                        *platform,
                        Arc::clone(&renderer),
                        Arc::clone(&cleaner),
                    )),
                )
            })
    }

    /// Adds or replaces the extractor for `platform`.
    #[must_use]
    pub fn with(mut self, platform: Platform, extractor: Arc<dyn PlatformExtractor>) -> Self {
        self.extractors.insert(platform, extractor);
        self
    }

    /// # Errors
    ///
    /// Returns [`SessionError::UnsupportedPlatform`] when nothing is
    /// registered for `platform`.
    pub fn get(&self, platform: Platform) -> Result<Arc<dyn PlatformExtractor>, SessionError> {
        self.extractors
            .get(&platform)
            .cloned()
            .ok_or(SessionError::UnsupportedPlatform(platform))
    }
}

/// Generic extractor: renders the page in a headless browser and hands the
/// cleaned text to the strategy chain. It yields no comments.
pub struct RenderedPageExtractor {
    platform: Platform,
    renderer: Arc<BrowserlessClient>,
    cleaner: Arc<dyn TextCleaner>,
}

impl RenderedPageExtractor {
    pub fn new(
        platform: Platform,
        renderer: Arc<BrowserlessClient>,
        cleaner: Arc<dyn TextCleaner>,
    ) -> Self {
        Self {
            platform,
            renderer,
            cleaner,
        }
    }
}

#[async_trait]
impl PlatformExtractor for RenderedPageExtractor {
    async fn open(&self, url: &str, _options: &ExtractOptions) -> Result<PlatformPage, SessionError> {
        // A failed render still leaves the screenshot strategy, so it is
        // reported as "no text" rather than failing the session.
        let html = match self.renderer.content(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(platform = %self.platform, url, error = %e, "page render failed");
                return Ok(PlatformPage::without_comments(MetricsSnapshot::default(), None));
            }
        };

        let snapshot = MetricsSnapshot {
            title: extract_title(&html).unwrap_or_default(),
            ..MetricsSnapshot::default()
        };
        let text = self.cleaner.clean(&html);
        tracing::debug!(platform = %self.platform, chars = text.len(), "page rendered");

        Ok(PlatformPage::without_comments(
            snapshot,
            (!text.is_empty()).then_some(text),
        ))
    }
}
