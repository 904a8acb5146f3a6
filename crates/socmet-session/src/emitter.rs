//! Ordered, cancellation-aware event delivery for one streaming session.
//!
//! Ordering rules the emitter enforces:
//! - `metrics` is sent at most once and before any `comment`;
//! - comment indices are assigned here, so they are gap-free;
//! - terminal methods take `self`, so nothing can follow them;
//! - after cancellation non-terminal emits are no-ops, and `complete` is
//!   only delivered when `metrics` already went out.

use chrono::{DateTime, Utc};
use socmet_core::{
    Comment, CommentPayload, CompletePayload, ErrorPayload, MetricsPayload, Platform,
};
use socmet_extract::ExtractionResult;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::assemble::assemble;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Metrics(MetricsPayload),
    Comment(CommentPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl StreamEvent {
    /// Event name on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Metrics(_) => "metrics",
            StreamEvent::Comment(_) => "comment",
            StreamEvent::Complete(_) => "complete",
            StreamEvent::Error(_) => "error",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete(_) | StreamEvent::Error(_))
    }

    /// Serializes the payload (without the event name) to JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        match self {
            StreamEvent::Metrics(p) => serde_json::to_string(p),
            StreamEvent::Comment(p) => serde_json::to_string(p),
            StreamEvent::Complete(p) => serde_json::to_string(p),
            StreamEvent::Error(p) => serde_json::to_string(p),
        }
    }
}

pub struct StreamEmitter {
    platform: Platform,
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    metrics_sent: bool,
    delivered: Vec<Comment>,
}

impl StreamEmitter {
    pub fn new(platform: Platform, tx: mpsc::Sender<StreamEvent>, cancel: CancellationToken) -> Self {
        Self {
            platform,
            tx,
            cancel,
            metrics_sent: false,
            delivered: Vec::new(),
        }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// A dropped receiver counts as cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn metrics_sent(&self) -> bool {
        self.metrics_sent
    }

    /// Comments delivered so far, in index order.
    #[must_use]
    pub fn delivered(&self) -> &[Comment] {
        &self.delivered
    }

    /// Sends the `metrics` event. Returns `false` if it was not delivered
    /// (already sent, or the session is cancelled).
    pub async fn metrics(&mut self, payload: MetricsPayload) -> bool {
        if self.metrics_sent {
            tracing::debug!(platform = %self.platform, "metrics already sent, ignoring");
            return false;
        }
        if self.send_unless_cancelled(StreamEvent::Metrics(payload)).await {
            self.metrics_sent = true;
        }
        self.metrics_sent
    }

    /// Sends the next `comment` event. Returns `false` if it was not
    /// delivered (no metrics yet, or the session is cancelled).
    pub async fn comment(&mut self, comment: Comment) -> bool {
        if !self.metrics_sent {
            tracing::debug!(platform = %self.platform, "comment before metrics, ignoring");
            return false;
        }
        let event = StreamEvent::Comment(CommentPayload {
            platform: self.platform,
            index: self.delivered.len(),
            comment: comment.clone(),
        });
        let sent = self.send_unless_cancelled(event).await;
        if sent {
            self.delivered.push(comment);
        }
        sent
    }

    /// Closes the session with `complete`, built from the delivered
    /// comments. Delivered even after cancellation, as long as `metrics`
    /// went out; a session that never published metrics ends silently.
    pub async fn complete(self, result: &ExtractionResult, scraped_at: DateTime<Utc>) {
        if !self.metrics_sent {
            tracing::debug!(platform = %self.platform, "no metrics sent, closing without complete");
            return;
        }
        let total_comments_streamed = self.delivered.len();
        let response = assemble(self.platform, result, self.delivered, scraped_at);
        let event = StreamEvent::Complete(CompletePayload {
            response,
            total_comments_streamed,
        });
        if self.tx.send(event).await.is_err() {
            tracing::debug!(platform = %self.platform, "receiver gone before complete");
        }
    }

    /// Closes the session with `error`. A no-op once cancelled.
    pub async fn error(mut self, message: impl Into<String>) {
        let payload = ErrorPayload {
            message: message.into(),
            platform: self.platform,
        };
        self.send_unless_cancelled(StreamEvent::Error(payload)).await;
    }

    async fn send_unless_cancelled(&mut self, event: StreamEvent) -> bool {
        if !self.cancel.is_cancelled() && self.tx.is_closed() {
            tracing::debug!(platform = %self.platform, "receiver dropped, cancelling session");
            self.cancel.cancel();
        }
        if self.cancel.is_cancelled() {
            return false;
        }
        let sent = tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            result = self.tx.send(event) => result.is_ok(),
        };
        if !sent && self.tx.is_closed() {
            self.cancel.cancel();
        }
        sent
    }
}
