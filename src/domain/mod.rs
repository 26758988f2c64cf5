//! Domain layer - Core business logic
//!
//! Contains value objects, the identification session entity and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod identification;
pub mod recording;
pub mod workflow;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use identification::MatchResult;
pub use recording::{AudioChunk, Duration, Encoding, Sample};
pub use workflow::{FailureKind, FailureReason, InvalidStateTransition, Session, WorkflowState};
