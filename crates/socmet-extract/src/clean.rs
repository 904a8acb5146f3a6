//! Flattens rendered HTML to the visible text the extractors inspect.

use std::sync::LazyLock;

use regex::Regex;

use crate::traits::TextCleaner;

/// Elements whose content is never visible text. The `regex` crate has no
/// backreferences, so each tag gets its own pattern.
static NOISY_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "noscript", "template"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("valid noisy block regex")
        })
        .collect()
});

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid html comment regex"));

static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)data:[^;\s]+;base64,[A-Za-z0-9+/=]+").expect("valid data uri regex")
});

static BASE64_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/=]{120,}").expect("valid base64 run regex"));

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid title regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Regex-based cleaner: drops script-like blocks, comments and inline base64
/// payloads, then strips the remaining tags and collapses whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextCleaner;

impl TextCleaner for HtmlTextCleaner {
    fn clean(&self, html: &str) -> String {
        let mut text = html.to_string();
        for block in NOISY_BLOCKS.iter() {
            text = block.replace_all(&text, " ").into_owned();
        }
        let text = HTML_COMMENT.replace_all(&text, " ");
        let text = DATA_URI.replace_all(&text, " ");
        let text = BASE64_RUN.replace_all(&text, " ");
        let text = TAG.replace_all(&text, " ");
        let text = decode_common_entities(&text);
        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }
}

/// Decodes the handful of entities that routinely sit next to counts
/// (`1&nbsp;234 likes`). `&amp;` goes last so `&amp;lt;` stays literal.
fn decode_common_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Returns the text of the first `<title>` element, if any.
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let title = WHITESPACE
        .replace_all(&decode_common_entities(raw), " ")
        .trim()
        .to_string();
    (!title.is_empty()).then_some(title)
}
