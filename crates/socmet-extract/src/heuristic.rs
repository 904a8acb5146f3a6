//! Regex-based engagement extraction over cleaned page text.
//!
//! Cheapest strategy in the chain: no I/O, pure and deterministic.

use std::sync::LazyLock;

use regex::Regex;

use crate::count::parse_count;
use crate::types::EngagementCounts;

/// Number with optional thousands groups/decimal part and an optional
/// standalone `k`/`m`/`b` suffix.
const NUMBER: &str = r"(?P<number>[0-9]+(?:[.,][0-9]+)*)(?:\s*(?P<suffix>[kmb])\b)?";

const LIKE_LABELS: &str = r"all\s+reactions?|reactions?|likes?";
const COMMENT_LABELS: &str = r"comments?";
const SHARE_LABELS: &str = r"shares?";

/// Ordered templates for one metric kind. The first that matches wins.
struct MetricPatterns {
    templates: Vec<Regex>,
}

impl MetricPatterns {
    fn new(labels: &str) -> Self {
        let label_first = format!(r"(?i)\b(?:{labels})\s*[:\-]?\s*{NUMBER}");
        let number_first = format!(r"(?i){NUMBER}\s+(?:{labels})\b");
        Self {
            templates: vec![
                Regex::new(&label_first).expect("valid label-first metric regex"),
                Regex::new(&number_first).expect("valid number-first metric regex"),
            ],
        }
    }

    /// Returns the normalized value and the matched substring.
    fn find(&self, text: &str) -> Option<(u64, String)> {
        self.templates.iter().find_map(|re| {
            let caps = re.captures(text)?;
            let number = caps.name("number")?.as_str();
            let suffix = caps.name("suffix").map_or("", |m| m.as_str());
            let evidence = caps.get(0)?.as_str().trim().to_string();
            Some((parse_count(&format!("{number}{suffix}")), evidence))
        })
    }
}

static LIKES: LazyLock<MetricPatterns> = LazyLock::new(|| MetricPatterns::new(LIKE_LABELS));
static COMMENTS: LazyLock<MetricPatterns> = LazyLock::new(|| MetricPatterns::new(COMMENT_LABELS));
static SHARES: LazyLock<MetricPatterns> = LazyLock::new(|| MetricPatterns::new(SHARE_LABELS));

/// Scans text for `"<label> <number>"` / `"<number> <label>"` phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    /// Returns `None` when no metric kind matched at all. A kind that
    /// matched and normalized to 0 is reported as `Some(0)`.
    #[must_use]
    pub fn extract(&self, text: &str) -> Option<EngagementCounts> {
        let likes = LIKES.find(text);
        let comments = COMMENTS.find(text);
        let shares = SHARES.find(text);

        if likes.is_none() && comments.is_none() && shares.is_none() {
            return None;
        }

        let evidence: Vec<&str> = [&likes, &comments, &shares]
            .into_iter()
            .filter_map(|m| m.as_ref().map(|(_, e)| e.as_str()))
            .collect();

        Some(EngagementCounts {
            likes: likes.as_ref().map(|(v, _)| *v),
            comments: comments.as_ref().map(|(v, _)| *v),
            shares: shares.as_ref().map(|(v, _)| *v),
            view: None,
            evidence: Some(evidence.join(" | ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_three_kinds_with_evidence() {
        let text = "Some Page 1.2K reactions · 34 comments · 5 shares";
        let counts = HeuristicExtractor.extract(text).expect("usable result");
        assert_eq!(counts.likes, Some(1_200));
        assert_eq!(counts.comments, Some(34));
        assert_eq!(counts.shares, Some(5));
        assert_eq!(counts.view, None);
        assert_eq!(
            counts.evidence.as_deref(),
            Some("1.2K reactions | 34 comments | 5 shares")
        );
    }

    #[test]
    fn label_first_template_takes_priority() {
        // "All reactions: 2.3K" matches the label-first template before the
        // number-first one could see "5 likes".
        let text = "All reactions: 2.3K. Also 5 likes elsewhere";
        let counts = HeuristicExtractor.extract(text).expect("usable result");
        assert_eq!(counts.likes, Some(2_300));
        assert_eq!(counts.comments, None);
        assert_eq!(counts.shares, None);
        assert_eq!(counts.evidence.as_deref(), Some("All reactions: 2.3K"));
    }

    #[test]
    fn first_matching_template_wins_even_if_later_text_differs() {
        // Label-first sees "reactions 34" before number-first sees "1.2K reactions".
        let counts = HeuristicExtractor
            .extract("1.2K reactions 34 comments")
            .expect("usable result");
        assert_eq!(counts.likes, Some(34));
    }

    #[test]
    fn number_first_form_is_matched() {
        let counts = HeuristicExtractor
            .extract("Posted yesterday. 1,234 Comments")
            .expect("usable result");
        assert_eq!(counts.comments, Some(1_234));
        assert_eq!(counts.likes, None);
    }

    #[test]
    fn matched_zero_is_distinct_from_missing() {
        let counts = HeuristicExtractor
            .extract("shares: 0")
            .expect("usable result");
        assert_eq!(counts.shares, Some(0));
        assert_eq!(counts.likes, None);
        assert!(counts.is_usable());
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(HeuristicExtractor.extract("nothing to see here"), None);
        assert_eq!(HeuristicExtractor.extract(""), None);
    }

    #[test]
    fn suffix_must_stand_alone() {
        let counts = HeuristicExtractor
            .extract("likes 5 by the river")
            .expect("usable result");
        assert_eq!(counts.likes, Some(5));
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "Reactions 7.7K · 120 comments · 44 shares";
        let first = HeuristicExtractor.extract(text);
        let second = HeuristicExtractor.extract(text);
        assert_eq!(first, second);
        assert!(first.is_some());
    }
}
