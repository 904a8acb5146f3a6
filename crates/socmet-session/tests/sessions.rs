//! Session-level behavior with in-memory collaborators: event ordering,
//! cancellation, terminal events and the aggregate response.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use socmet_core::{Comment, MetricsSnapshot, Platform};
use socmet_extract::{
    CaptureOptions, CredentialPrecondition, CredentialStatus, ExtractError, FallbackOrchestrator,
    OrchestratorSettings, ScreenshotCapture, TextCompletionModel, TextModelExtractor, VisionModel,
    VisionModelExtractor,
};
use socmet_session::{
    ExtractOptions, PlatformExtractor, PlatformPage, PlatformRegistry, ScrapeService,
    SessionError, StreamEmitter, StreamEvent,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FixedModel(Option<&'static str>);

#[async_trait]
impl TextCompletionModel for FixedModel {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, ExtractError> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| ExtractError::Transport {
                collaborator: "fake-text",
                message: "unreachable".to_string(),
            })
    }
}

#[async_trait]
impl VisionModel for FixedModel {
    async fn describe(
        &self,
        _image: &[u8],
        _prompt: &str,
        _timeout: Duration,
    ) -> Result<String, ExtractError> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| ExtractError::Transport {
                collaborator: "fake-vision",
                message: "unreachable".to_string(),
            })
    }
}

struct FakeCapture;

#[async_trait]
impl ScreenshotCapture for FakeCapture {
    async fn capture(&self, _url: &str, _options: &CaptureOptions) -> Result<Vec<u8>, ExtractError> {
        Ok(b"png".to_vec())
    }
}

struct FixedPrecondition(CredentialStatus);

#[async_trait]
impl CredentialPrecondition for FixedPrecondition {
    async fn check(&self, _platform: Platform) -> CredentialStatus {
        self.0
    }
}

/// Serves a fixed page. Comments are yielded lazily; `polled` counts how
/// many the session actually pulled, and `cancel_at` cancels the given
/// token when that comment index is pulled.
#[derive(Clone)]
struct FakePage {
    body: Option<&'static str>,
    snapshot: MetricsSnapshot,
    comments: Vec<Result<Comment, String>>,
    cancel_at: Option<(usize, CancellationToken)>,
    polled: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl FakePage {
    fn new(body: &'static str) -> Self {
        Self {
            body: Some(body),
            snapshot: MetricsSnapshot {
                display_name: "Some Creator".to_string(),
                ..MetricsSnapshot::default()
            },
            comments: Vec::new(),
            cancel_at: None,
            polled: Arc::new(AtomicUsize::new(0)),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_comments(mut self, count: usize) -> Self {
        self.comments = (0..count)
            .map(|i| Ok(Comment::new(format!("user{i}"), format!("comment {i}"))))
            .collect();
        self
    }
}

#[async_trait]
impl PlatformExtractor for FakePage {
    async fn open(&self, _url: &str, _options: &ExtractOptions) -> Result<PlatformPage, SessionError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let polled = Arc::clone(&self.polled);
        let cancel_at = self.cancel_at.clone();
        let comments = stream::iter(self.comments.clone().into_iter().enumerate())
            .map(move |(i, item)| {
                polled.fetch_add(1, Ordering::SeqCst);
                if let Some((at, token)) = &cancel_at {
                    if i == *at {
                        token.cancel();
                    }
                }
                item.map_err(|message| SessionError::Comments {
                    platform: Platform::Tiktok,
                    message,
                })
            })
            .boxed();
        Ok(PlatformPage {
            snapshot: self.snapshot.clone(),
            body_text: self.body.map(str::to_string),
            comments,
        })
    }
}

fn service(
    page: FakePage,
    text: Option<&'static str>,
    vision: Option<&'static str>,
    status: CredentialStatus,
    max_comments: usize,
) -> ScrapeService {
    let orchestrator = FallbackOrchestrator::new(
        TextModelExtractor::new(Arc::new(FixedModel(text)), Duration::from_secs(5), 10_000),
        VisionModelExtractor::new(
            Arc::new(FakeCapture),
            Arc::new(FixedModel(vision)),
            CaptureOptions::default(),
            Duration::from_secs(5),
        ),
        Arc::new(FixedPrecondition(status)),
        OrchestratorSettings::default(),
    );
    let registry = PlatformRegistry::new()
        .with(Platform::Tiktok, Arc::new(page.clone()))
        .with(Platform::Facebook, Arc::new(page));
    ScrapeService::new(registry, orchestrator, ExtractOptions { max_comments })
}

async fn run_stream(
    service: &ScrapeService,
    platform: Platform,
    cancel: CancellationToken,
) -> Vec<StreamEvent> {
    let (tx, mut rx) = mpsc::channel(64);
    let emitter = StreamEmitter::new(platform, tx, cancel);
    service
        .stream(platform, "https://www.tiktok.com/@someone/video/1", emitter)
        .await;
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn names(events: &[StreamEvent]) -> Vec<&'static str> {
    events.iter().map(StreamEvent::name).collect()
}

const COUNTS_TEXT: &str = "1.2K likes, 340 comments";
const NO_COUNTS_TEXT: &str = "A video about cooking.";

// ---------------------------------------------------------------------------
// Streaming sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn metrics_precede_gap_free_comments_and_one_complete() {
    let mut page = FakePage::new(COUNTS_TEXT).with_comments(3);
    page.comments.insert(1, Ok(Comment::new("ghost", "   ")));
    let service = service(page, None, None, CredentialStatus::Ok, 20);

    let events = run_stream(&service, Platform::Tiktok, CancellationToken::new()).await;
    assert_eq!(
        names(&events),
        ["metrics", "comment", "comment", "comment", "complete"]
    );

    let StreamEvent::Metrics(metrics) = &events[0] else {
        panic!("first event must be metrics");
    };
    assert_eq!(metrics.likes, 1_200);
    assert_eq!(metrics.comments_count, 340);
    assert_eq!(metrics.display_name, "Some Creator");
    assert!(metrics.scraped_at.is_some());

    for (expected, event) in events[1..4].iter().enumerate() {
        let StreamEvent::Comment(comment) = event else {
            panic!("expected comment, got {event:?}");
        };
        assert_eq!(comment.index, expected);
        assert_eq!(comment.platform, Platform::Tiktok);
    }

    let StreamEvent::Complete(complete) = &events[4] else {
        panic!("expected complete");
    };
    assert_eq!(complete.total_comments_streamed, 3);
    assert_eq!(complete.response.comments.len(), 3);
    assert_eq!(complete.response.comments_count, 3);
    assert_eq!(complete.response.likes, 1_200);
}

#[tokio::test]
async fn comment_delivery_is_bounded_by_max_comments() {
    let page = FakePage::new(COUNTS_TEXT).with_comments(10);
    let polled = Arc::clone(&page.polled);
    let service = service(page, None, None, CredentialStatus::Ok, 4);

    let events = run_stream(&service, Platform::Tiktok, CancellationToken::new()).await;
    let StreamEvent::Complete(complete) = events.last().unwrap() else {
        panic!("expected complete");
    };
    assert_eq!(complete.total_comments_streamed, 4);
    assert_eq!(polled.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn cancel_mid_enumeration_completes_with_delivered_comments() {
    let cancel = CancellationToken::new();
    let mut page = FakePage::new(COUNTS_TEXT).with_comments(10);
    // Pulling the sixth comment (index 5) trips the cancellation.
    page.cancel_at = Some((5, cancel.clone()));
    let polled = Arc::clone(&page.polled);
    let service = service(page, None, None, CredentialStatus::Ok, 20);

    let events = run_stream(&service, Platform::Tiktok, cancel).await;

    assert_eq!(events.len(), 7, "metrics + 5 comments + complete");
    let StreamEvent::Complete(complete) = events.last().unwrap() else {
        panic!("terminal event must be complete, got {:?}", events.last());
    };
    assert_eq!(complete.response.comments.len(), 5);
    assert_eq!(complete.total_comments_streamed, 5);
    assert_eq!(complete.response.comments_count, 5);
    assert_eq!(polled.load(Ordering::SeqCst), 6, "enumeration stops promptly");
}

#[tokio::test]
async fn source_error_racing_cancellation_still_completes() {
    let cancel = CancellationToken::new();
    let mut page = FakePage::new(COUNTS_TEXT).with_comments(2);
    page.comments.push(Err("source broke".to_string()));
    // The failing pull is also the one that trips the cancellation.
    page.cancel_at = Some((2, cancel.clone()));
    let service = service(page, None, None, CredentialStatus::Ok, 20);

    let events = run_stream(&service, Platform::Tiktok, cancel).await;

    assert_eq!(names(&events), ["metrics", "comment", "comment", "complete"]);
    let StreamEvent::Complete(complete) = events.last().unwrap() else {
        unreachable!();
    };
    assert_eq!(complete.total_comments_streamed, 2);
}

#[tokio::test]
async fn cancel_before_start_emits_nothing() {
    let page = FakePage::new(COUNTS_TEXT).with_comments(3);
    let opened = Arc::clone(&page.opened);
    let service = service(page, None, None, CredentialStatus::Ok, 20);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let events = run_stream(&service, Platform::Tiktok, cancel).await;
    assert!(events.is_empty(), "got {events:?}");
    assert_eq!(opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhausted_extraction_emits_single_error() {
    let page = FakePage::new(NO_COUNTS_TEXT).with_comments(3);
    let service = service(
        page,
        Some("nothing to report"),
        None,
        CredentialStatus::Ok,
        20,
    );

    let events = run_stream(&service, Platform::Tiktok, CancellationToken::new()).await;
    assert_eq!(names(&events), ["error"]);
    let StreamEvent::Error(error) = &events[0] else {
        unreachable!();
    };
    assert_eq!(error.platform, Platform::Tiktok);
    assert!(error.message.starts_with("extraction exhausted"), "{}", error.message);
}

#[tokio::test]
async fn failed_precondition_emits_single_error() {
    let page = FakePage::new(COUNTS_TEXT);
    let opened = Arc::clone(&page.opened);
    let service = service(page, None, None, CredentialStatus::Missing, 20);

    let events = run_stream(&service, Platform::Facebook, CancellationToken::new()).await;
    assert_eq!(names(&events), ["error"]);
    let StreamEvent::Error(error) = &events[0] else {
        unreachable!();
    };
    assert_eq!(error.message, "facebook session credentials are missing");
    assert_eq!(opened.load(Ordering::SeqCst), 0, "page is never opened");
}

#[tokio::test]
async fn comment_source_failure_terminates_with_error() {
    let mut page = FakePage::new(COUNTS_TEXT).with_comments(2);
    page.comments.push(Err("selector vanished".to_string()));
    page.comments.push(Ok(Comment::new("late", "never delivered")));
    let service = service(page, None, None, CredentialStatus::Ok, 20);

    let events = run_stream(&service, Platform::Tiktok, CancellationToken::new()).await;
    assert_eq!(names(&events), ["metrics", "comment", "comment", "error"]);
    let StreamEvent::Error(error) = &events[3] else {
        unreachable!();
    };
    assert!(error.message.contains("selector vanished"));
}

#[tokio::test]
async fn unregistered_platform_emits_error() {
    let service = service(FakePage::new(COUNTS_TEXT), None, None, CredentialStatus::Ok, 20);
    let events = run_stream(&service, Platform::Youtube, CancellationToken::new()).await;
    assert_eq!(names(&events), ["error"]);
}

#[tokio::test]
async fn spawned_session_streams_until_complete() {
    let page = FakePage::new(COUNTS_TEXT).with_comments(2);
    let service = Arc::new(service(page, None, None, CredentialStatus::Ok, 20));

    let mut handle = service.spawn_stream(
        Platform::Tiktok,
        "https://www.tiktok.com/@someone/video/1".to_string(),
    );
    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }
    handle.task.await.expect("session task panicked");
    assert_eq!(names(&events), ["metrics", "comment", "comment", "complete"]);
}

// ---------------------------------------------------------------------------
// Aggregate sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn aggregate_uses_text_model_when_heuristic_finds_nothing() {
    let page = FakePage::new(NO_COUNTS_TEXT).with_comments(2);
    let service = service(
        page,
        Some(r#"{"likes":500,"comments":null,"shares":10,"evidence":"500 Likes"}"#),
        Some(r#"{"likes":1}"#),
        CredentialStatus::Ok,
        20,
    );

    let response = service
        .scrape(Platform::Tiktok, "https://www.tiktok.com/@someone/video/1")
        .await
        .unwrap();
    assert_eq!(response.likes, 500);
    assert_eq!(response.shares, 10);
    assert_eq!(response.comments.len(), 2);
    assert_eq!(response.comments_count, 2);
}

#[tokio::test]
async fn aggregate_exhausted_is_typed_error() {
    let service = service(
        FakePage::new(NO_COUNTS_TEXT),
        None,
        None,
        CredentialStatus::Ok,
        20,
    );
    let err = service
        .scrape(Platform::Tiktok, "https://www.tiktok.com/@someone/video/1")
        .await
        .unwrap_err();
    assert!(
        matches!(err, SessionError::Extract(ExtractError::Exhausted { .. })),
        "got {err:?}"
    );
}

#[tokio::test]
async fn aggregate_bounds_and_filters_comments() {
    let mut page = FakePage::new(COUNTS_TEXT).with_comments(6);
    page.comments.insert(0, Ok(Comment::new("blank", "")));
    let service = service(page, None, None, CredentialStatus::Ok, 3);

    let response = service
        .scrape(Platform::Tiktok, "https://www.tiktok.com/@someone/video/1")
        .await
        .unwrap();
    assert_eq!(response.comments.len(), 3);
    assert_eq!(response.comments[0].text, "comment 0");
    assert_eq!(response.comments_count, 3);
}
