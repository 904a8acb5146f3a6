//! In-memory collaborators for router tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use axum::Router;
use futures::stream::{self, StreamExt};
use socmet_core::{Comment, MetricsSnapshot, Platform};
use socmet_extract::{
    CaptureOptions, CredentialPrecondition, CredentialStatus, ExtractError, FallbackOrchestrator,
    OrchestratorSettings, ScreenshotCapture, TextCompletionModel, TextModelExtractor, VisionModel,
    VisionModelExtractor,
};
use socmet_session::{
    ExtractOptions, PlatformExtractor, PlatformPage, PlatformRegistry, ScrapeService, SessionError,
};

use super::{build_app, default_rate_limit_state, AppState};
use crate::middleware::AuthState;

/// What the fake page and models return.
#[derive(Debug, Clone, Copy)]
pub struct FakeSetup {
    pub body: Option<&'static str>,
    pub comments: usize,
    pub credentials: CredentialStatus,
    pub model_reply: Option<&'static str>,
}

impl Default for FakeSetup {
    fn default() -> Self {
        Self {
            body: None,
            comments: 0,
            credentials: CredentialStatus::Ok,
            model_reply: None,
        }
    }
}

struct FixedModel(Option<&'static str>);

impl FixedModel {
    fn reply(&self, collaborator: &'static str) -> Result<String, ExtractError> {
        self.0.map(str::to_string).ok_or(ExtractError::Transport {
            collaborator,
            message: "offline".to_string(),
        })
    }
}

#[async_trait]
impl TextCompletionModel for FixedModel {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, ExtractError> {
        self.reply("text-model")
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
        self.reply("vision-model")
    }
}

struct BlankCapture;

#[async_trait]
impl ScreenshotCapture for BlankCapture {
    async fn capture(&self, _url: &str, _options: &CaptureOptions) -> Result<Vec<u8>, ExtractError> {
        Ok(b"png".to_vec())
    }
}

struct FixedCredentials(CredentialStatus);

#[async_trait]
impl CredentialPrecondition for FixedCredentials {
    async fn check(&self, _platform: Platform) -> CredentialStatus {
        self.0
    }
}

struct FakePage(FakeSetup);

#[async_trait]
impl PlatformExtractor for FakePage {
    async fn open(&self, _url: &str, _options: &ExtractOptions) -> Result<PlatformPage, SessionError> {
        let comments = stream::iter(0..self.0.comments)
            .map(|i| Ok::<_, SessionError>(Comment::new(format!("user{i}"), format!("comment {i}"))))
            .boxed();
        Ok(PlatformPage {
            snapshot: MetricsSnapshot {
                display_name: "Some Creator".to_string(),
                ..MetricsSnapshot::default()
            },
            body_text: self.0.body.map(str::to_string),
            comments,
        })
    }
}

fn service(setup: FakeSetup) -> ScrapeService {
    let model = Arc::new(FixedModel(setup.model_reply));
    let orchestrator = FallbackOrchestrator::new(
        TextModelExtractor::new(model.clone(), Duration::from_secs(1), 4_000),
        VisionModelExtractor::new(
            Arc::new(BlankCapture),
            model,
            CaptureOptions::default(),
            Duration::from_secs(1),
        ),
        Arc::new(FixedCredentials(setup.credentials)),
        OrchestratorSettings::default(),
    );
    let page: Arc<dyn PlatformExtractor> = Arc::new(FakePage(setup));
    let registry = Platform::ALL
        .iter()
        .fold(PlatformRegistry::new(), |registry, platform| {
            registry.with(*platform, Arc::clone(&page))
        });
    ScrapeService::new(registry, orchestrator, ExtractOptions::default())
}

/// Router with auth disabled.
pub fn app(setup: FakeSetup) -> Router {
    let auth = AuthState::from_keys("", true).expect("dev auth");
    app_with(setup, auth)
}

pub fn app_with(setup: FakeSetup, auth: AuthState) -> Router {
    build_app(
        AppState {
            scrape: Arc::new(service(setup)),
        },
        auth,
        default_rate_limit_state(),
    )
}

pub async fn read_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn read_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&read_text(response).await).expect("json parse")
}
