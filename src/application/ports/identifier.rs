//! Identification port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::identification::MatchResult;
use crate::domain::recording::Sample;
use crate::domain::workflow::FailureReason;

/// Identification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentificationError {
    #[error("Identification request failed: {0}")]
    Transport(String),

    #[error("No match found: {0}")]
    NoMatch(String),
}

impl From<IdentificationError> for FailureReason {
    fn from(err: IdentificationError) -> Self {
        match err {
            IdentificationError::Transport(detail) => FailureReason::transport(detail),
            IdentificationError::NoMatch(detail) => FailureReason::no_match(detail),
        }
    }
}

/// Port for the remote song identification service
#[async_trait]
pub trait Identifier: Send + Sync {
    /// Submit a sample and interpret the answer.
    ///
    /// Issues exactly one request per call.
    async fn identify(&self, sample: &Sample) -> Result<MatchResult, IdentificationError>;
}
