use std::fmt;

use serde::{Deserialize, Serialize};
use socmet_core::MetricsSnapshot;

/// One of the three extraction approaches, ordered by cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Heuristic,
    TextModel,
    Vision,
}

impl Strategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Heuristic => "heuristic",
            Strategy::TextModel => "text-model",
            Strategy::Vision => "vision",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engagement counts as reported by a single strategy.
///
/// `None` means the kind was not found at all, which is distinct from a
/// kind that was found and normalized to 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementCounts {
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub shares: Option<u64>,
    pub view: Option<u64>,
    pub evidence: Option<String>,
}

impl EngagementCounts {
    /// A result is usable when at least one metric kind was found.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.likes.is_some() || self.comments.is_some() || self.shares.is_some() || self.view.is_some()
    }

    /// Overlays the found kinds onto `base`; kinds that were not found keep
    /// the base value.
    #[must_use]
    pub fn apply_to(&self, base: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            likes: self.likes.unwrap_or(base.likes),
            comments_count: self.comments.unwrap_or(base.comments_count),
            shares: self.shares.unwrap_or(base.shares),
            view: self.view.unwrap_or(base.view),
            ..base.clone()
        }
    }
}

/// The usable output of the fallback chain for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub snapshot: MetricsSnapshot,
    pub strategy: Strategy,
    pub evidence: Option<String>,
}
