//! Identification workflow controller
//!
//! A single task owns the whole Idle -> Recording -> Analyzing -> Success | Error
//! cycle. Callers talk to it through a [`WorkflowHandle`]: commands go in over
//! a channel and every state change comes back as a [`WorkflowSnapshot`].

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use super::negotiator::CaptureNegotiator;
use super::ports::{AudioDevice, Identifier, NotificationIcon, Notifier};
use super::recording::{Activity, RecordingSession, StopTrigger};
use crate::domain::identification::MatchResult;
use crate::domain::recording::{Duration, Encoding};
use crate::domain::workflow::{FailureReason, InvalidStateTransition, Session, WorkflowState};

/// Notification title
pub const APP_NAME: &str = "AudioPrint";

/// Shown when the microphone could not be acquired
pub const ACCESS_DENIED_MESSAGE: &str = "Microphone access denied!";

/// Shown for every failed attempt, whatever the cause
pub const FAILURE_MESSAGE: &str = "No match found or server error.";

const COMMAND_BUFFER: usize = 16;

/// Requests accepted by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowCommand {
    Start,
    Stop,
    Shutdown,
}

/// What the presentation layer is allowed to see
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSnapshot {
    state: WorkflowState,
    encoding: Option<Encoding>,
    result: Option<MatchResult>,
    access_denied: bool,
}

impl WorkflowSnapshot {
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Encoding of the current session, if there is one
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// The match, present only in `Success`
    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Set when the last start could not acquire the microphone
    pub fn access_denied(&self) -> bool {
        self.access_denied
    }
}

/// Errors from talking to the controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Workflow controller is no longer running")]
    Closed,
}

/// Configuration for the controller
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Recording limit, clamped to the ceiling
    pub max_duration: Duration,
    /// Encoding to negotiate for
    pub preferred_encoding: Encoding,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::recording_ceiling(),
            preferred_encoding: Encoding::default(),
        }
    }
}

/// Cloneable handle for driving a running controller
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    commands: mpsc::Sender<WorkflowCommand>,
    snapshots: watch::Receiver<WorkflowSnapshot>,
}

impl WorkflowHandle {
    /// Begin a new attempt. Ignored while one is in flight.
    pub async fn start(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Start).await
    }

    /// End the recording early. Ignored unless recording.
    pub async fn stop(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Stop).await
    }

    /// Release the device and stop the controller
    pub async fn shutdown(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Shutdown).await
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`, starting with the current one
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<WorkflowSnapshot, WorkflowError>
    where
        F: FnMut(&WorkflowSnapshot) -> bool,
    {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| WorkflowError::Closed)?;
        Ok(snapshot.clone())
    }

    async fn send(&self, command: WorkflowCommand) -> Result<(), WorkflowError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| WorkflowError::Closed)
    }
}

enum Wake {
    Command(Option<WorkflowCommand>),
    Deadline,
    Activity(Activity),
}

/// The actor that sequences one identification attempt at a time
pub struct WorkflowController<D, I, N>
where
    D: AudioDevice,
    I: Identifier,
    N: Notifier,
{
    device: D,
    identifier: I,
    notifier: N,
    negotiator: CaptureNegotiator,
    config: WorkflowConfig,
    commands: mpsc::Receiver<WorkflowCommand>,
    snapshots: watch::Sender<WorkflowSnapshot>,
    session: Option<Session>,
    recording: Option<RecordingSession>,
}

impl<D, I, N> WorkflowController<D, I, N>
where
    D: AudioDevice,
    I: Identifier,
    N: Notifier,
{
    /// Create a controller and the handle that drives it
    pub fn new(device: D, identifier: I, notifier: N, config: WorkflowConfig) -> (Self, WorkflowHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(WorkflowSnapshot::default());

        let controller = Self {
            device,
            identifier,
            notifier,
            negotiator: CaptureNegotiator::new(config.preferred_encoding),
            config,
            commands: command_rx,
            snapshots: snapshot_tx,
            session: None,
            recording: None,
        };
        let handle = WorkflowHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (controller, handle)
    }

    /// Current state; `Idle` when there is no session
    pub fn state(&self) -> WorkflowState {
        self.session
            .as_ref()
            .map_or(WorkflowState::Idle, Session::state)
    }

    /// Process commands until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        debug!("Workflow controller running");
        loop {
            let keep_running = match self.state() {
                WorkflowState::Recording => self.step_recording().await,
                WorkflowState::Analyzing => self.step_analyzing().await,
                WorkflowState::Idle | WorkflowState::Success | WorkflowState::Error => {
                    self.step_waiting().await
                }
            };
            if !keep_running {
                break;
            }
        }
        debug!(state = %self.state(), "Workflow controller stopped");
    }

    async fn step_waiting(&mut self) -> bool {
        match self.commands.recv().await {
            Some(WorkflowCommand::Start) => {
                self.begin_capture().await;
                true
            }
            Some(WorkflowCommand::Stop) => {
                debug!("Stop ignored, nothing is recording");
                true
            }
            Some(WorkflowCommand::Shutdown) | None => false,
        }
    }

    async fn begin_capture(&mut self) {
        // A new attempt throws away the previous result
        self.session = None;
        self.publish();

        let encoding = self.negotiator.select_encoding(&self.device);
        match RecordingSession::start(&self.device, encoding, self.config.max_duration).await {
            Ok(recording) => {
                self.recording = Some(recording);
                self.session = Some(Session::begin(encoding));
                self.publish();
                self.notify("Listening...", NotificationIcon::Listening).await;
            }
            Err(err) => {
                warn!(error = %err, "Could not acquire microphone");
                self.publish_denied();
                self.notify(ACCESS_DENIED_MESSAGE, NotificationIcon::Warning).await;
            }
        }
    }

    async fn step_recording(&mut self) -> bool {
        let Some(recording) = self.recording.as_mut() else {
            error!("Recording state without a live recording");
            self.record_failure(FailureReason::capture("recording was lost")).await;
            return true;
        };

        let deadline = recording.deadline();
        let wake = tokio::select! {
            command = self.commands.recv() => Wake::Command(command),
            _ = time::sleep_until(deadline) => Wake::Deadline,
            activity = recording.next_activity() => Wake::Activity(activity),
        };

        match wake {
            Wake::Command(Some(WorkflowCommand::Start)) => {
                warn!("Start rejected, already recording");
                true
            }
            Wake::Command(Some(WorkflowCommand::Stop)) => {
                self.finish_recording(StopTrigger::Explicit).await;
                true
            }
            Wake::Command(Some(WorkflowCommand::Shutdown)) | Wake::Command(None) => {
                self.abandon_recording();
                false
            }
            Wake::Deadline => {
                info!("Recording limit reached");
                self.finish_recording(StopTrigger::Deadline).await;
                true
            }
            Wake::Activity(Activity::Buffered { bytes }) => {
                trace!(bytes, total = recording.buffered_bytes(), "Buffered audio chunk");
                true
            }
            Wake::Activity(Activity::RecorderStopped) => {
                debug!("Recorder stopped on its own");
                self.finish_recording(StopTrigger::Recorder).await;
                true
            }
            Wake::Activity(Activity::RecorderFailed(message)) => {
                warn!(error = %message, "Recorder failed");
                self.finish_recording(StopTrigger::Recorder).await;
                true
            }
        }
    }

    async fn finish_recording(&mut self, trigger: StopTrigger) {
        let Some(mut recording) = self.recording.take() else {
            return;
        };

        let outcome = recording.stop(trigger).await;
        info!(
            trigger = trigger.as_str(),
            recorded_ms = recording.recorded_for().as_millis() as u64,
            "Recording finished"
        );

        match outcome {
            Ok(sample) => {
                debug!(
                    size = %sample.human_readable_size(),
                    encoding = %sample.encoding(),
                    "Sample finalized"
                );
                let transition = match self.session.as_mut() {
                    Some(session) => session.complete_recording(sample),
                    None => return,
                };
                self.check(transition);
                self.publish();
            }
            Err(err) => {
                warn!(error = %err, "Capture failed");
                self.record_failure(FailureReason::capture(err.to_string())).await;
            }
        }
    }

    fn abandon_recording(&mut self) {
        if let Some(mut recording) = self.recording.take() {
            recording.abandon();
        }
        self.session = None;
        self.publish();
    }

    async fn step_analyzing(&mut self) -> bool {
        let Some(sample) = self.session.as_ref().and_then(Session::sample).cloned() else {
            error!("Analyzing state without a sample");
            self.record_failure(FailureReason::capture("sample was lost")).await;
            return true;
        };

        info!(size = %sample.human_readable_size(), "Identifying sample");

        // The request is never cancelled. Shutdown only stops the loop afterwards.
        let mut shutdown_requested = false;
        let outcome = {
            let mut request = self.identifier.identify(&sample);
            loop {
                tokio::select! {
                    outcome = &mut request => break outcome,
                    command = self.commands.recv(), if !shutdown_requested => match command {
                        Some(WorkflowCommand::Start) => warn!("Start rejected, identification in progress"),
                        Some(WorkflowCommand::Stop) => debug!("Stop ignored, recording already finished"),
                        Some(WorkflowCommand::Shutdown) | None => {
                            info!("Shutdown requested, waiting for identification to finish");
                            shutdown_requested = true;
                        }
                    },
                }
            }
        };

        match outcome {
            Ok(result) => {
                info!(
                    song = result.song_label(),
                    confidence = result.confidence(),
                    offset_seconds = result.offset_seconds(),
                    "Match found"
                );
                let message = result.to_string();
                if let Some(session) = self.session.as_mut() {
                    let transition = session.succeed(result);
                    self.check(transition);
                }
                self.publish();
                self.notify(&message, NotificationIcon::Match).await;
            }
            Err(err) => {
                warn!(error = %err, "Identification failed");
                self.record_failure(err.into()).await;
            }
        }

        !shutdown_requested
    }

    async fn record_failure(&mut self, reason: FailureReason) {
        if let Some(session) = self.session.as_mut() {
            let transition = session.fail(reason);
            self.check(transition);
        }
        self.publish();
        self.notify(FAILURE_MESSAGE, NotificationIcon::Error).await;
    }

    fn check(&self, transition: Result<(), InvalidStateTransition>) {
        if let Err(err) = transition {
            error!(error = %err, "Workflow transition rejected");
        }
    }

    async fn notify(&self, message: &str, icon: NotificationIcon) {
        if let Err(err) = self.notifier.notify(APP_NAME, message, icon).await {
            debug!(error = %err, "Notification not shown");
        }
    }

    fn publish(&self) {
        self.send_snapshot(false);
    }

    fn publish_denied(&self) {
        self.send_snapshot(true);
    }

    fn send_snapshot(&self, access_denied: bool) {
        let snapshot = match &self.session {
            Some(session) => WorkflowSnapshot {
                state: session.state(),
                encoding: Some(session.encoding()),
                result: session.result().cloned(),
                access_denied,
            },
            None => WorkflowSnapshot {
                access_denied,
                ..WorkflowSnapshot::default()
            },
        };
        trace!(state = %snapshot.state, "Publishing snapshot");
        self.snapshots.send_replace(snapshot);
    }
}
