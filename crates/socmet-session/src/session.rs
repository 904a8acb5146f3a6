//! End-to-end scrape sessions: aggregate and streaming.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use socmet_core::{AppConfig, Comment, MetricsPayload, Platform, ScrapeResponse};
use socmet_extract::{
    BrowserlessClient, CaptureOptions, ChatVisionClient, CookieFilePrecondition, ExtractError,
    ExtractionResult, FallbackOrchestrator, HtmlTextCleaner, OllamaClient, OrchestratorSettings,
    PageInput, TextModelExtractor, VisionModelExtractor,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::assemble::assemble;
use crate::emitter::{StreamEmitter, StreamEvent};
use crate::error::SessionError;
use crate::platform::{CommentStream, ExtractOptions, PlatformRegistry};

/// Events buffered between a streaming session and its consumer.
const STREAM_BUFFER: usize = 32;

/// Receiving side of a spawned streaming session.
pub struct StreamHandle {
    pub events: mpsc::Receiver<StreamEvent>,
    /// Cancelling stops the session at its next emission or comment.
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

pub struct ScrapeService {
    registry: PlatformRegistry,
    orchestrator: FallbackOrchestrator,
    options: ExtractOptions,
}

impl ScrapeService {
    pub fn new(
        registry: PlatformRegistry,
        orchestrator: FallbackOrchestrator,
        options: ExtractOptions,
    ) -> Self {
        Self {
            registry,
            orchestrator,
            options,
        }
    }

    /// Wires the HTTP-backed collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ExtractError> {
        let browserless = Arc::new(BrowserlessClient::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
            Duration::from_millis(config.page_timeout_ms),
        )?);
        let ollama = OllamaClient::new(
            &config.text_model_url,
            &config.text_model,
            config.text_model_insecure_tls,
        )?;
        let vision_model = ChatVisionClient::new(
            &config.vision_model_url,
            &config.vision_model,
            config.vision_model_token.as_deref(),
        )?;

        let orchestrator = FallbackOrchestrator::new(
            TextModelExtractor::new(
                Arc::new(ollama),
                Duration::from_millis(config.text_model_timeout_ms),
                config.text_model_max_chars,
            ),
            VisionModelExtractor::new(
                browserless.clone(),
                Arc::new(vision_model),
                CaptureOptions {
                    full_page: true,
                    scroll_to_bottom: config.vision_scroll,
                },
                Duration::from_millis(config.vision_timeout_ms),
            ),
            Arc::new(CookieFilePrecondition::from_config(config)),
            OrchestratorSettings {
                session_platforms: config.session_platforms.clone(),
            },
        );

        Ok(Self::new(
            PlatformRegistry::rendered(browserless, Arc::new(HtmlTextCleaner)),
            orchestrator,
            ExtractOptions {
                max_comments: config.max_comments,
            },
        ))
    }

    /// Runs one aggregate session and returns the unified response.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when the platform is unsupported, the
    /// precondition fails, extraction is exhausted, or the comment source
    /// fails.
    pub async fn scrape(&self, platform: Platform, url: &str) -> Result<ScrapeResponse, SessionError> {
        tracing::info!(%platform, url, "aggregate session started");
        let (result, mut comments) = self.prepare(platform, url).await?;

        let mut collected: Vec<Comment> = Vec::new();
        while collected.len() < self.options.max_comments {
            match comments.next().await {
                Some(Ok(comment)) if is_blank(&comment) => {}
                Some(Ok(comment)) => collected.push(comment),
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        tracing::info!(
            %platform,
            strategy = %result.strategy,
            comments = collected.len(),
            "aggregate session finished"
        );
        Ok(assemble(platform, &result, collected, Utc::now()))
    }

    /// Runs one streaming session, writing events through `emitter`.
    ///
    /// Cancellation is cooperative: it is observed before each emission and
    /// between comments. A model or browser call already in flight finishes
    /// or hits its own timeout first, so that timeout bounds the latency.
    pub async fn stream(&self, platform: Platform, url: &str, mut emitter: StreamEmitter) {
        if emitter.is_cancelled() {
            tracing::debug!(%platform, "session cancelled before start");
            return;
        }
        tracing::info!(%platform, url, "streaming session started");

        let (result, mut comments) = match self.prepare(platform, url).await {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(%platform, error = %e, "streaming session failed");
                emitter.error(e.to_string()).await;
                return;
            }
        };

        let scraped_at = Utc::now();
        let metrics = MetricsPayload::from_snapshot(platform, &result.snapshot, Some(scraped_at));
        if !emitter.metrics(metrics).await {
            tracing::debug!(%platform, "session cancelled before metrics");
            return;
        }

        let cancel = emitter.cancellation().clone();
        while emitter.delivered().len() < self.options.max_comments {
            if emitter.is_cancelled() {
                break;
            }
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = comments.next() => next,
            };
            match next {
                Some(Ok(comment)) if is_blank(&comment) => {}
                Some(Ok(comment)) => {
                    if !emitter.comment(comment).await {
                        break;
                    }
                }
                Some(Err(e)) if emitter.is_cancelled() => {
                    tracing::debug!(%platform, error = %e, "comment source failed after cancellation");
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(%platform, error = %e, "comment source failed");
                    emitter.error(e.to_string()).await;
                    return;
                }
                None => break,
            }
        }

        tracing::info!(
            %platform,
            strategy = %result.strategy,
            comments = emitter.delivered().len(),
            cancelled = emitter.is_cancelled(),
            "streaming session finished"
        );
        emitter.complete(&result, scraped_at).await;
    }

    /// Spawns a streaming session on the runtime.
    #[must_use]
    pub fn spawn_stream(self: &Arc<Self>, platform: Platform, url: String) -> StreamHandle {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let cancel = CancellationToken::new();
        let emitter = StreamEmitter::new(platform, tx, cancel.clone());
        let service = Arc::clone(self);
        let task = tokio::spawn(async move {
            service.stream(platform, &url, emitter).await;
        });
        StreamHandle {
            events: rx,
            cancel,
            task,
        }
    }

    async fn prepare(
        &self,
        platform: Platform,
        url: &str,
    ) -> Result<(ExtractionResult, CommentStream), SessionError> {
        let extractor = self.registry.get(platform)?;
        self.orchestrator.check_precondition(platform).await?;

        let page = extractor.open(url, &self.options).await?;
        let result = self
            .orchestrator
            .extract(PageInput {
                platform,
                url,
                body_text: page.body_text.as_deref(),
                base: &page.snapshot,
            })
            .await?;
        Ok((result, page.comments))
    }
}

fn is_blank(comment: &Comment) -> bool {
    comment.text.trim().is_empty()
}
