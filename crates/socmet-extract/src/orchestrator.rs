//! Cost-ordered fallback over the three extraction strategies.
//!
//! `Init -> Heuristic -> TextModel -> Vision -> Done`. Strategies run
//! strictly one after another; each is attempted once.

use std::sync::Arc;

use socmet_core::{MetricsSnapshot, Platform};

use crate::error::{CredentialStatus, ExtractError, StrategyAttempt};
use crate::heuristic::HeuristicExtractor;
use crate::text_model::TextModelExtractor;
use crate::traits::CredentialPrecondition;
use crate::types::{EngagementCounts, ExtractionResult, Strategy};
use crate::vision::VisionModelExtractor;

const FULL_CHAIN: [Strategy; 3] = [Strategy::Heuristic, Strategy::TextModel, Strategy::Vision];
const VISION_ONLY: [Strategy; 1] = [Strategy::Vision];

#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    /// Platforms whose content is only reachable through an authenticated
    /// browser session; they skip straight to the vision strategy.
    pub session_platforms: Vec<Platform>,
}

/// What the platform extractor already knows about the page.
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    pub platform: Platform,
    pub url: &'a str,
    /// Cleaned visible text, when the page could be rendered to text.
    pub body_text: Option<&'a str>,
    /// Identity fields and any counts the platform reported natively.
    pub base: &'a MetricsSnapshot,
}

pub struct FallbackOrchestrator {
    heuristic: HeuristicExtractor,
    text_model: TextModelExtractor,
    vision: VisionModelExtractor,
    precondition: Arc<dyn CredentialPrecondition>,
    settings: OrchestratorSettings,
}

impl FallbackOrchestrator {
    pub fn new(
        text_model: TextModelExtractor,
        vision: VisionModelExtractor,
        precondition: Arc<dyn CredentialPrecondition>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            heuristic: HeuristicExtractor,
            text_model,
            vision,
            precondition,
            settings,
        }
    }

    /// The strategies attempted for `platform`, in order.
    #[must_use]
    pub fn chain_for(&self, platform: Platform) -> &'static [Strategy] {
        if self.settings.session_platforms.contains(&platform) {
            &VISION_ONLY
        } else {
            &FULL_CHAIN
        }
    }

    /// The `Init` state: fails fast when required session credentials are
    /// missing or expired.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Precondition`] for a `Missing` or `Expired`
    /// status.
    pub async fn check_precondition(&self, platform: Platform) -> Result<(), ExtractError> {
        match self.precondition.check(platform).await {
            CredentialStatus::Ok => Ok(()),
            status => {
                tracing::warn!(%platform, %status, "session precondition failed");
                Err(ExtractError::Precondition { platform, status })
            }
        }
    }

    /// Runs the precondition check followed by the strategy chain.
    ///
    /// # Errors
    ///
    /// See [`Self::check_precondition`] and [`Self::extract`].
    pub async fn run(&self, page: PageInput<'_>) -> Result<ExtractionResult, ExtractError> {
        self.check_precondition(page.platform).await?;
        self.extract(page).await
    }

    /// Runs the strategy chain, stopping at the first usable result.
    ///
    /// Counts found by the winning strategy overlay `page.base`; kinds it
    /// did not report keep the base value.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Exhausted`] when no strategy produced a usable
    /// result, or a fatal error raised by a strategy.
    pub async fn extract(&self, page: PageInput<'_>) -> Result<ExtractionResult, ExtractError> {
        let mut attempts = Vec::new();

        for &strategy in self.chain_for(page.platform) {
            tracing::debug!(platform = %page.platform, %strategy, "attempting strategy");
            let outcome = self.attempt(strategy, &page).await;

            match outcome {
                Ok(Some(counts)) => {
                    tracing::info!(platform = %page.platform, %strategy, "extraction succeeded");
                    return Ok(ExtractionResult {
                        snapshot: counts.apply_to(page.base),
                        strategy,
                        evidence: counts.evidence,
                    });
                }
                Ok(None) => {
                    tracing::debug!(platform = %page.platform, %strategy, "strategy found nothing");
                    attempts.push(StrategyAttempt {
                        strategy,
                        outcome: "no result".to_string(),
                    });
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(platform = %page.platform, %strategy, error = %e, "strategy failed, falling through");
                    attempts.push(StrategyAttempt {
                        strategy,
                        outcome: e.to_string(),
                    });
                }
            }
        }

        Err(ExtractError::Exhausted { attempts })
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        page: &PageInput<'_>,
    ) -> Result<Option<EngagementCounts>, ExtractError> {
        match strategy {
            Strategy::Heuristic => Ok(page.body_text.and_then(|t| self.heuristic.extract(t))),
            Strategy::TextModel => match page.body_text {
                Some(text) if !text.trim().is_empty() => self.text_model.extract(text).await,
                _ => Ok(None),
            },
            Strategy::Vision => self.vision.extract(page.url).await,
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
