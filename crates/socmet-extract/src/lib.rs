pub mod clean;
pub mod clients;
pub mod count;
pub mod credentials;
pub mod error;
pub mod heuristic;
pub mod orchestrator;
pub mod reply;
pub mod text_model;
pub mod traits;
pub mod types;
pub mod vision;

pub use clean::HtmlTextCleaner;
pub use clients::{BrowserlessClient, ChatVisionClient, OllamaClient};
pub use count::{parse_count, parse_count_token};
pub use credentials::CookieFilePrecondition;
pub use error::{CredentialStatus, ExtractError, StrategyAttempt};
pub use heuristic::HeuristicExtractor;
pub use orchestrator::{FallbackOrchestrator, OrchestratorSettings, PageInput};
pub use text_model::TextModelExtractor;
pub use traits::{
    CaptureOptions, CredentialPrecondition, ScreenshotCapture, TextCleaner, TextCompletionModel,
    VisionModel,
};
pub use types::{EngagementCounts, ExtractionResult, Strategy};
pub use vision::VisionModelExtractor;
