use std::sync::Arc;
use std::time::Duration;

use crate::error::ExtractError;
use crate::reply::parse_engagement_reply;
use crate::traits::{CaptureOptions, ScreenshotCapture, VisionModel};
use crate::types::EngagementCounts;

pub const VISION_PROMPT: &str = "\
You read engagement metrics from social media screenshots. Inspect the image and extract the total \
counts of reactions/likes, comments, shares and video views if present. Respond ONLY with JSON using \
this schema: {\"likes\": number|null, \"comments\": number|null, \"shares\": number|null, \
\"view\": number|null, \"evidence\": string|null}. Convert abbreviations like 2.3K or 1.1M into \
absolute numbers. Treat views, viewers and plays as the \"view\" value. If a count is missing or \
unclear, set it to null. Evidence is the original text snippet you used, or null. Do not add extra text.";

/// Screenshots the page and asks a vision model to read the counts.
pub struct VisionModelExtractor {
    capture: Arc<dyn ScreenshotCapture>,
    model: Arc<dyn VisionModel>,
    options: CaptureOptions,
    timeout: Duration,
}

impl VisionModelExtractor {
    pub fn new(
        capture: Arc<dyn ScreenshotCapture>,
        model: Arc<dyn VisionModel>,
        options: CaptureOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            capture,
            model,
            options,
            timeout,
        }
    }

    /// # Errors
    ///
    /// Returns [`ExtractError::Transport`] when the screenshot cannot be
    /// captured or the model call fails or times out.
    pub async fn extract(&self, url: &str) -> Result<Option<EngagementCounts>, ExtractError> {
        let image = self.capture.capture(url, &self.options).await?;
        tracing::debug!(url, image_bytes = image.len(), "requesting vision extraction");

        let reply = tokio::time::timeout(
            self.timeout,
            self.model.describe(&image, VISION_PROMPT, self.timeout),
        )
        .await
        .map_err(|_| {
            ExtractError::transport(
                "vision-model",
                format!("timed out after {} ms", self.timeout.as_millis()),
            )
        })??;

        Ok(parse_engagement_reply(&reply))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct FakeCapture {
        result: Result<Vec<u8>, &'static str>,
        seen: Mutex<Vec<(String, CaptureOptions)>>,
    }

    #[async_trait]
    impl ScreenshotCapture for FakeCapture {
        async fn capture(
            &self,
            url: &str,
            options: &CaptureOptions,
        ) -> Result<Vec<u8>, ExtractError> {
            self.seen.lock().unwrap().push((url.to_string(), *options));
            self.result
                .clone()
                .map_err(|msg| ExtractError::transport("screenshot", msg))
        }
    }

    struct FakeVision(&'static str);

    #[async_trait]
    impl VisionModel for FakeVision {
        async fn describe(
            &self,
            image: &[u8],
            prompt: &str,
            _timeout: Duration,
        ) -> Result<String, ExtractError> {
            assert_eq!(image, b"png-bytes");
            assert!(prompt.contains("\"view\""));
            Ok(self.0.to_string())
        }
    }

    fn capture_ok() -> Arc<FakeCapture> {
        Arc::new(FakeCapture {
            result: Ok(b"png-bytes".to_vec()),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn reads_counts_including_view() {
        let capture = capture_ok();
        let options = CaptureOptions {
            full_page: true,
            scroll_to_bottom: true,
        };
        let extractor = VisionModelExtractor::new(
            capture.clone(),
            Arc::new(FakeVision(
                "```json\n{\"likes\":\"3.4K\",\"comments\":12,\"shares\":null,\"view\":\"1.1M\",\"evidence\":\"3.4K\"}\n```",
            )),
            options,
            Duration::from_secs(5),
        );
        let counts = extractor
            .extract("https://example.com/post")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counts.likes, Some(3_400));
        assert_eq!(counts.comments, Some(12));
        assert_eq!(counts.view, Some(1_100_000));

        let seen = capture.seen.lock().unwrap();
        assert_eq!(seen[0].0, "https://example.com/post");
        assert!(seen[0].1.scroll_to_bottom);
    }

    #[tokio::test]
    async fn capture_failure_is_transport_error() {
        let capture = Arc::new(FakeCapture {
            result: Err("browser crashed"),
            seen: Mutex::new(Vec::new()),
        });
        let extractor = VisionModelExtractor::new(
            capture,
            Arc::new(FakeVision("{}")),
            CaptureOptions::default(),
            Duration::from_secs(5),
        );
        let err = extractor.extract("https://example.com").await.unwrap_err();
        assert!(matches!(err, ExtractError::Transport { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_reply_is_no_result() {
        let extractor = VisionModelExtractor::new(
            capture_ok(),
            Arc::new(FakeVision("")),
            CaptureOptions::default(),
            Duration::from_secs(5),
        );
        assert!(extractor.extract("https://example.com").await.unwrap().is_none());
    }
}
