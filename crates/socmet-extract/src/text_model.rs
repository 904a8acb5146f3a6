use std::sync::Arc;
use std::time::Duration;

use crate::error::ExtractError;
use crate::reply::parse_engagement_reply;
use crate::traits::TextCompletionModel;
use crate::types::EngagementCounts;

const PROMPT_HEADER: &str = "\
You are a data extraction assistant analysing text from a social media page.
Extract the total numbers of likes/reactions, comments and shares if they are explicitly present.
If numbers are abbreviated (e.g. 2.2K, 1.5M), convert them to the full numeric value.
Respond ONLY with JSON using this schema:
{\"likes\": number | null, \"comments\": number | null, \"shares\": number | null, \"evidence\": string | null}
Set any missing value to null. Evidence is a short snippet or label, or null if unavailable.
Do not infer or fabricate numbers.
Content to inspect:";

/// Builds the extraction prompt around `body`.
#[must_use]
pub fn build_prompt(body: &str) -> String {
    format!("{PROMPT_HEADER}\n\"\"\"{body}\"\"\"")
}

/// Asks a text-completion model to read counts out of page text.
pub struct TextModelExtractor {
    model: Arc<dyn TextCompletionModel>,
    timeout: Duration,
    max_chars: usize,
}

impl TextModelExtractor {
    /// `max_chars` bounds how much page text is embedded in the prompt.
    pub fn new(model: Arc<dyn TextCompletionModel>, timeout: Duration, max_chars: usize) -> Self {
        Self {
            model,
            timeout,
            max_chars,
        }
    }

    /// Returns `Ok(None)` when the reply holds no locatable JSON or reports
    /// no metric.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Transport`] when the model call fails or does
    /// not finish within the configured timeout.
    pub async fn extract(&self, text: &str) -> Result<Option<EngagementCounts>, ExtractError> {
        let body = truncate_chars(text, self.max_chars);
        let prompt = build_prompt(body);
        tracing::debug!(
            body_chars = body.chars().count(),
            truncated = body.len() < text.len(),
            "requesting text-model extraction"
        );

        let reply = tokio::time::timeout(self.timeout, self.model.complete(&prompt, self.timeout))
            .await
            .map_err(|_| {
                ExtractError::transport(
                    "text-model",
                    format!("timed out after {} ms", self.timeout.as_millis()),
                )
            })??;

        let counts = parse_engagement_reply(&reply);
        if counts.is_none() {
            tracing::debug!(reply_len = reply.len(), "text-model reply held no usable counts");
        }
        Ok(counts)
    }
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}
