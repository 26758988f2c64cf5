//! Bounded recording session
//!
//! Owns the capture stream between acquisition and release, buffers chunks in
//! arrival order and turns them into exactly one [`Sample`].

use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::ports::{AudioDevice, CaptureStream, DeviceError, RecorderEvent};
use crate::domain::error::EmptySampleError;
use crate::domain::recording::{AudioChunk, Duration, Encoding, Sample};

/// How long a stopped recorder may take to flush and acknowledge
pub const FLUSH_WINDOW: StdDuration = StdDuration::from_secs(2);

/// Recording errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("No audio input device available: {0}")]
    DeviceUnavailable(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error(transparent)]
    Empty(#[from] EmptySampleError),
}

impl RecordingError {
    /// Whether the device was never acquired
    pub fn is_access_error(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::DeviceUnavailable(_))
    }
}

impl From<DeviceError> for RecordingError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied(msg) => Self::PermissionDenied(msg),
            DeviceError::Unavailable(msg) => Self::DeviceUnavailable(msg),
        }
    }
}

/// What caused a recording to end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTrigger {
    Explicit,
    Deadline,
    Recorder,
    Shutdown,
}

impl StopTrigger {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Deadline => "deadline",
            Self::Recorder => "recorder",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Something the recorder reported while running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Buffered { bytes: usize },
    RecorderStopped,
    RecorderFailed(String),
}

/// A live recording with a fixed deadline
pub struct RecordingSession {
    encoding: Encoding,
    stream: Option<Box<dyn CaptureStream>>,
    events: mpsc::UnboundedReceiver<RecorderEvent>,
    chunks: Vec<AudioChunk>,
    started_at: Instant,
    deadline: Instant,
    stopped_at: Option<Instant>,
    recorder_done: bool,
    failure: Option<String>,
    outcome: Option<Result<Sample, RecordingError>>,
}

impl RecordingSession {
    /// Acquire the device and start recording.
    ///
    /// `limit` is clamped to the recording ceiling. If the recorder refuses to
    /// start, the device is released before the error is returned.
    pub async fn start<D: AudioDevice + ?Sized>(
        device: &D,
        encoding: Encoding,
        limit: Duration,
    ) -> Result<Self, RecordingError> {
        let limit = limit.clamp_to_ceiling();
        let mut stream = device.request_access().await?;

        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(err) = stream.start(encoding, tx) {
            stream.release();
            return Err(err.into());
        }

        let started_at = Instant::now();
        info!(encoding = %encoding, limit = %limit, "Recording started");

        Ok(Self {
            encoding,
            stream: Some(stream),
            events: rx,
            chunks: Vec::new(),
            started_at,
            deadline: started_at + limit.as_std(),
            stopped_at: None,
            recorder_done: false,
            failure: None,
            outcome: None,
        })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Instant at which the recording must be stopped
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time spent recording so far, or in total once stopped
    pub fn recorded_for(&self) -> StdDuration {
        let end = self.stopped_at.unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.started_at)
    }

    /// Bytes buffered so far
    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(AudioChunk::len).sum()
    }

    pub fn is_stopped(&self) -> bool {
        self.outcome.is_some()
    }

    /// Wait for the next recorder event.
    ///
    /// Never resolves once the recorder has finished, so it can sit in a
    /// `select!` next to the deadline. Cancel safe.
    pub async fn next_activity(&mut self) -> Activity {
        if self.recorder_done || self.outcome.is_some() {
            return std::future::pending().await;
        }

        loop {
            match self.events.recv().await {
                Some(RecorderEvent::Data(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    let bytes = chunk.len();
                    self.chunks.push(chunk);
                    return Activity::Buffered { bytes };
                }
                Some(RecorderEvent::Stopped) | None => {
                    self.recorder_done = true;
                    return Activity::RecorderStopped;
                }
                Some(RecorderEvent::Failed(message)) => {
                    self.recorder_done = true;
                    self.failure = Some(message.clone());
                    return Activity::RecorderFailed(message);
                }
            }
        }
    }

    /// Stop recording and finalize the sample.
    ///
    /// Only the first call does any work. Later calls return the same outcome,
    /// and for a successful recording the very same sample buffer.
    pub async fn stop(&mut self, trigger: StopTrigger) -> Result<Sample, RecordingError> {
        if let Some(outcome) = &self.outcome {
            debug!(trigger = trigger.as_str(), "Recording already finalized");
            return outcome.clone();
        }

        let outcome = self.finalize(trigger).await;
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Release the device and throw away whatever was captured.
    ///
    /// The recorder is never asked to stop, so it does not flush or encode
    /// audio that would be discarded anyway.
    pub fn abandon(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            info!("Recording abandoned, device released");
        }
        self.chunks.clear();
        self.stopped_at.get_or_insert_with(Instant::now);
        if self.outcome.is_none() {
            self.outcome = Some(Err(RecordingError::CaptureFailed(
                "recording abandoned".to_string(),
            )));
        }
    }

    async fn finalize(&mut self, trigger: StopTrigger) -> Result<Sample, RecordingError> {
        if let Some(mut stream) = self.stream.take() {
            if !self.recorder_done {
                stream.stop();
                self.drain(Instant::now() + FLUSH_WINDOW).await;
            }
            stream.release();
        }

        let stopped_at = Instant::now();
        self.stopped_at = Some(stopped_at);
        debug!(
            trigger = trigger.as_str(),
            elapsed_ms = stopped_at.saturating_duration_since(self.started_at).as_millis() as u64,
            chunks = self.chunks.len(),
            "Recording stopped"
        );

        if let Some(message) = self.failure.take() {
            self.chunks.clear();
            return Err(RecordingError::CaptureFailed(message));
        }

        let chunks = std::mem::take(&mut self.chunks);
        Ok(Sample::assemble(chunks, self.encoding)?)
    }

    /// Collect the recorder's final chunks until it acknowledges the stop
    async fn drain(&mut self, flush_deadline: Instant) {
        loop {
            match time::timeout_at(flush_deadline, self.events.recv()).await {
                Ok(Some(RecorderEvent::Data(chunk))) => {
                    if !chunk.is_empty() {
                        self.chunks.push(chunk);
                    }
                }
                Ok(Some(RecorderEvent::Stopped)) | Ok(None) => break,
                Ok(Some(RecorderEvent::Failed(message))) => {
                    self.failure = Some(message);
                    break;
                }
                Err(_) => {
                    warn!(
                        window_ms = FLUSH_WINDOW.as_millis() as u64,
                        "Recorder did not acknowledge stop, finalizing with buffered data"
                    );
                    break;
                }
            }
        }
        self.recorder_done = true;
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }
}
