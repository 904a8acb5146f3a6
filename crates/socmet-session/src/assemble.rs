use chrono::{DateTime, Utc};
use socmet_core::{Comment, Platform, ScrapeResponse};
use socmet_extract::ExtractionResult;

/// Builds the unified response from the chosen extraction result and the
/// comments actually delivered.
///
/// `comments_count` is the length of `comments`, not the count the strategy
/// detected, so the two can never disagree under partial delivery.
#[must_use]
pub fn assemble(
    platform: Platform,
    result: &ExtractionResult,
    comments: Vec<Comment>,
    scraped_at: DateTime<Utc>,
) -> ScrapeResponse {
    let snapshot = &result.snapshot;
    ScrapeResponse {
        platform,
        display_name: snapshot.display_name.clone(),
        title: snapshot.title.clone(),
        followers: snapshot.followers,
        comments_count: u64::try_from(comments.len()).unwrap_or(u64::MAX),
        bookmarks: snapshot.bookmarks,
        reposts: snapshot.reposts,
        view: snapshot.view,
        shares: snapshot.shares,
        likes: snapshot.likes,
        comments,
        scraped_at,
    }
}
