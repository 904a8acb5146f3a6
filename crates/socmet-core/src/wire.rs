//! Snapshot, comment and response shapes shared by the extraction pipeline,
//! the HTTP surface and the CLI.
//!
//! Field names on the wire mirror the published event contract: identity
//! fields are camelCase, `comments_count` stays snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Platform;

/// Metrics observed for one piece of content. Counters default to 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub display_name: String,
    pub title: String,
    pub followers: u64,
    pub comments_count: u64,
    pub bookmarks: u64,
    pub reposts: u64,
    pub view: u64,
    pub shares: u64,
    pub likes: u64,
}

/// A single user comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author_name: String,
    pub text: String,
}

impl Comment {
    #[must_use]
    pub fn new(author_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            text: text.into(),
        }
    }
}

/// Payload of the `metrics` stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsPayload {
    pub platform: Platform,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub title: String,
    pub followers: u64,
    pub comments_count: u64,
    pub bookmarks: u64,
    pub reposts: u64,
    pub view: u64,
    pub shares: u64,
    pub likes: u64,
    #[serde(rename = "scrapedAt", skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl MetricsPayload {
    #[must_use]
    pub fn from_snapshot(
        platform: Platform,
        snapshot: &MetricsSnapshot,
        scraped_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            platform,
            display_name: snapshot.display_name.clone(),
            title: snapshot.title.clone(),
            followers: snapshot.followers,
            comments_count: snapshot.comments_count,
            bookmarks: snapshot.bookmarks,
            reposts: snapshot.reposts,
            view: snapshot.view,
            shares: snapshot.shares,
            likes: snapshot.likes,
            scraped_at,
        }
    }
}

/// Payload of the `comment` stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPayload {
    pub platform: Platform,
    pub index: usize,
    pub comment: Comment,
}

/// Unified cross-platform response, returned by the aggregate endpoint and
/// embedded in the `complete` stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub platform: Platform,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub title: String,
    pub followers: u64,
    pub comments_count: u64,
    pub bookmarks: u64,
    pub reposts: u64,
    pub view: u64,
    pub shares: u64,
    pub likes: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(rename = "scrapedAt")]
    pub scraped_at: DateTime<Utc>,
}

/// Payload of the `complete` stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePayload {
    #[serde(flatten)]
    pub response: ScrapeResponse,
    pub total_comments_streamed: usize,
}

/// Payload of the `error` stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    pub platform: Platform,
}
