use std::fmt;

use socmet_core::Platform;
use thiserror::Error;

use crate::types::Strategy;

/// Result of a credential precondition check for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Ok,
    Missing,
    Expired,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStatus::Ok => f.write_str("ok"),
            CredentialStatus::Missing => f.write_str("missing"),
            CredentialStatus::Expired => f.write_str("expired"),
        }
    }
}

/// Why one strategy did not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    pub outcome: String,
}

impl fmt::Display for StrategyAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.outcome)
    }
}

fn summarize(attempts: &[StrategyAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// A collaborator call failed at the network or protocol level, or timed out.
    #[error("{collaborator} transport error: {message}")]
    Transport {
        collaborator: &'static str,
        message: String,
    },

    /// A model reply was not valid or locatable JSON.
    #[error("could not parse {context}: {message}")]
    Parse { context: String, message: String },

    /// Required session credentials are missing or expired.
    #[error("{platform} session credentials are {status}")]
    Precondition {
        platform: Platform,
        status: CredentialStatus,
    },

    /// Every strategy ran without a usable result.
    #[error("extraction exhausted: {}", summarize(.attempts))]
    Exhausted { attempts: Vec<StrategyAttempt> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ExtractError {
    pub(crate) fn transport(collaborator: &'static str, message: impl fmt::Display) -> Self {
        ExtractError::Transport {
            collaborator,
            message: message.to_string(),
        }
    }

    /// `true` for failures that end the fallback chain immediately.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::Precondition { .. } | ExtractError::Exhausted { .. }
        )
    }
}
