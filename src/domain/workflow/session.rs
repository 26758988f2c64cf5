//! Identification session state machine

use std::fmt;
use thiserror::Error;

use crate::domain::identification::MatchResult;
use crate::domain::recording::{Encoding, Sample};

/// Workflow states as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Recording,
    Analyzing,
    Success,
    Error,
}

impl WorkflowState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Analyzing => "analyzing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Whether a session is in flight (new starts are rejected)
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Recording | Self::Analyzing)
    }

    /// Whether the attempt has finished, one way or the other
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an identification attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The recorder or encoder failed, or nothing was captured
    Capture,
    /// Network failure, malformed response or non-success status
    Transport,
    /// The service ran and found nothing
    NoMatch,
}

impl FailureKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Transport => "transport",
            Self::NoMatch => "no match",
        }
    }
}

/// Failure reason kept on the session for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    kind: FailureKind,
    detail: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn capture(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Capture, detail)
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, detail)
    }

    pub fn no_match(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::NoMatch, detail)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: WorkflowState,
    pub action: String,
}

/// One identification attempt.
///
/// A session only exists once the microphone has been granted, so it is born
/// in `Recording`. `Idle` is the absence of a session.
///
/// State machine:
///   RECORDING -> ANALYZING (complete_recording)
///   RECORDING -> ERROR     (fail, capture failure)
///   ANALYZING -> SUCCESS   (succeed)
///   ANALYZING -> ERROR     (fail)
#[derive(Debug, Clone)]
pub struct Session {
    state: WorkflowState,
    encoding: Encoding,
    sample: Option<Sample>,
    result: Option<MatchResult>,
    error: Option<FailureReason>,
}

impl Session {
    /// Begin a session that is recording with the negotiated encoding
    pub fn begin(encoding: Encoding) -> Self {
        Self {
            state: WorkflowState::Recording,
            encoding,
            sample: None,
            result: None,
            error: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The finalized sample, present once recording completed
    pub fn sample(&self) -> Option<&Sample> {
        self.sample.as_ref()
    }

    /// The match, present only in `Success`
    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// The failure reason, present only in `Error`
    pub fn error(&self) -> Option<&FailureReason> {
        self.error.as_ref()
    }

    /// Transition from RECORDING to ANALYZING
    pub fn complete_recording(&mut self, sample: Sample) -> Result<(), InvalidStateTransition> {
        self.expect(WorkflowState::Recording, "complete recording")?;
        self.sample = Some(sample);
        self.state = WorkflowState::Analyzing;
        Ok(())
    }

    /// Transition from ANALYZING to SUCCESS
    pub fn succeed(&mut self, result: MatchResult) -> Result<(), InvalidStateTransition> {
        self.expect(WorkflowState::Analyzing, "record a match")?;
        self.result = Some(result);
        self.state = WorkflowState::Success;
        Ok(())
    }

    /// Transition from RECORDING or ANALYZING to ERROR
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), InvalidStateTransition> {
        if !self.state.is_busy() {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "record a failure".to_string(),
            });
        }
        self.error = Some(reason);
        self.state = WorkflowState::Error;
        Ok(())
    }

    fn expect(&self, state: WorkflowState, action: &str) -> Result<(), InvalidStateTransition> {
        if self.state != state {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sample {
        Sample::new(vec![1, 2, 3], Encoding::Flac).unwrap()
    }

    fn track() -> MatchResult {
        MatchResult::new("Test Track", 42, 3.5).unwrap()
    }

    #[test]
    fn new_session_is_recording_without_artifacts() {
        let session = Session::begin(Encoding::Wav);
        assert_eq!(session.state(), WorkflowState::Recording);
        assert_eq!(session.encoding(), Encoding::Wav);
        assert!(session.sample().is_none());
        assert!(session.result().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn complete_recording_stores_sample() {
        let mut session = Session::begin(Encoding::Flac);
        session.complete_recording(sample()).unwrap();
        assert_eq!(session.state(), WorkflowState::Analyzing);
        assert_eq!(session.sample().unwrap().data(), &[1, 2, 3]);
    }

    #[test]
    fn complete_recording_twice_fails() {
        let mut session = Session::begin(Encoding::Flac);
        session.complete_recording(sample()).unwrap();

        let err = session.complete_recording(sample()).unwrap_err();
        assert_eq!(err.current_state, WorkflowState::Analyzing);
        assert!(err.action.contains("complete recording"));
    }

    #[test]
    fn succeed_from_analyzing() {
        let mut session = Session::begin(Encoding::Flac);
        session.complete_recording(sample()).unwrap();
        session.succeed(track()).unwrap();

        assert_eq!(session.state(), WorkflowState::Success);
        assert_eq!(session.result().unwrap().song_label(), "Test Track");
        assert!(session.error().is_none());
    }

    #[test]
    fn succeed_while_recording_fails() {
        let mut session = Session::begin(Encoding::Flac);
        let err = session.succeed(track()).unwrap_err();
        assert_eq!(err.current_state, WorkflowState::Recording);
        assert!(session.result().is_none());
    }

    #[test]
    fn fail_from_analyzing_keeps_kind() {
        let mut session = Session::begin(Encoding::Flac);
        session.complete_recording(sample()).unwrap();
        session.fail(FailureReason::no_match("No matches found")).unwrap();

        assert_eq!(session.state(), WorkflowState::Error);
        assert_eq!(session.error().unwrap().kind(), FailureKind::NoMatch);
        assert!(session.result().is_none());
    }

    #[test]
    fn fail_from_recording_has_no_sample() {
        let mut session = Session::begin(Encoding::Flac);
        session.fail(FailureReason::capture("stream died")).unwrap();

        assert_eq!(session.state(), WorkflowState::Error);
        assert!(session.sample().is_none());
    }

    #[test]
    fn result_and_error_are_exclusive() {
        let mut session = Session::begin(Encoding::Flac);
        session.complete_recording(sample()).unwrap();
        session.succeed(track()).unwrap();

        assert!(session.fail(FailureReason::transport("late")).is_err());
        assert!(session.result().is_some());
        assert!(session.error().is_none());

        let mut failed = Session::begin(Encoding::Flac);
        failed.complete_recording(sample()).unwrap();
        failed.fail(FailureReason::transport("HTTP 500")).unwrap();
        assert!(failed.succeed(track()).is_err());
        assert!(failed.result().is_none());
    }

    #[test]
    fn busy_and_finished_states() {
        assert!(!WorkflowState::Idle.is_busy());
        assert!(WorkflowState::Recording.is_busy());
        assert!(WorkflowState::Analyzing.is_busy());
        assert!(WorkflowState::Success.is_finished());
        assert!(WorkflowState::Error.is_finished());
        assert!(!WorkflowState::Idle.is_finished());
    }

    #[test]
    fn state_display() {
        assert_eq!(WorkflowState::Idle.to_string(), "idle");
        assert_eq!(WorkflowState::Analyzing.to_string(), "analyzing");
        assert_eq!(WorkflowState::Error.to_string(), "error");
    }

    #[test]
    fn failure_display() {
        let reason = FailureReason::transport("HTTP 500");
        assert_eq!(reason.to_string(), "transport: HTTP 500");
    }
}
