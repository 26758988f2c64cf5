//! Identification workflow domain module

mod session;

pub use session::{FailureKind, FailureReason, InvalidStateTransition, Session, WorkflowState};
