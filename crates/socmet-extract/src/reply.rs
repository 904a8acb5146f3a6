//! Two-stage parsing of model replies into [`EngagementCounts`].

use serde_json::{Map, Value};

use crate::count::parse_count_token;
use crate::types::EngagementCounts;

/// Parses a model reply.
///
/// Stage one parses the trimmed reply as strict JSON. If that fails, stage
/// two parses the first balanced `{...}` substring (models like to wrap JSON
/// in prose or code fences). Returns `None` when neither stage yields a JSON
/// object, or when the object reports no metric at all.
#[must_use]
pub fn parse_engagement_reply(raw: &str) -> Option<EngagementCounts> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let object = parse_object(trimmed)
        .or_else(|| first_balanced_object(trimmed).and_then(parse_object))?;

    let counts = counts_from_object(&object);
    counts.is_usable().then_some(counts)
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn counts_from_object(object: &Map<String, Value>) -> EngagementCounts {
    let field = |key: &str| object.get(key).and_then(parse_count_token);
    let evidence = object
        .get("evidence")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(ToString::to_string);

    EngagementCounts {
        likes: field("likes"),
        comments: field("comments"),
        shares: field("shares"),
        view: field("view"),
        evidence,
    }
}

/// Finds the first `{` and returns the slice up to its matching `}`,
/// ignoring braces inside JSON string literals.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
