//! Application layer - Use cases and port interfaces
//!
//! Contains the capture-and-identify workflow and trait definitions
//! for external system interactions.

pub mod negotiator;
pub mod ports;
pub mod recording;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export use cases
pub use negotiator::CaptureNegotiator;
pub use recording::{Activity, RecordingError, RecordingSession, StopTrigger, FLUSH_WINDOW};
pub use workflow::{
    WorkflowCommand, WorkflowConfig, WorkflowController, WorkflowError, WorkflowHandle,
    WorkflowSnapshot, ACCESS_DENIED_MESSAGE, APP_NAME, FAILURE_MESSAGE,
};
