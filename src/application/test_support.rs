//! Scripted port implementations shared by the application unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;

use super::ports::{
    AudioDevice, CaptureStream, DeviceError, IdentificationError, Identifier, NotificationError,
    NotificationIcon, Notifier, RecorderEvent, RecorderEvents,
};
use crate::domain::identification::MatchResult;
use crate::domain::recording::{AudioChunk, Encoding, Sample};

/// Counts what happened to the scripted device
#[derive(Debug, Default)]
pub struct DeviceLog {
    pub acquisitions: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub releases: AtomicUsize,
}

impl DeviceLog {
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// A device that replays fixed chunks
#[derive(Clone)]
pub struct ScriptedDevice {
    pub supported: Vec<Encoding>,
    pub denial: Option<DeviceError>,
    pub chunks: Vec<Vec<u8>>,
    pub tail: Option<Vec<u8>>,
    pub acknowledge_stop: bool,
    pub failure: Option<String>,
    pub start_failure: Option<DeviceError>,
    pub log: Arc<DeviceLog>,
}

impl ScriptedDevice {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            supported: Encoding::ALL.to_vec(),
            denial: None,
            chunks,
            tail: None,
            acknowledge_stop: true,
            failure: None,
            start_failure: None,
            log: Arc::new(DeviceLog::default()),
        }
    }

    pub fn denying(error: DeviceError) -> Self {
        Self {
            denial: Some(error),
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl AudioDevice for ScriptedDevice {
    fn supports(&self, encoding: Encoding) -> bool {
        self.supported.contains(&encoding)
    }

    async fn request_access(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        self.log.acquisitions.fetch_add(1, Ordering::SeqCst);
        if let Some(denial) = &self.denial {
            return Err(denial.clone());
        }
        Ok(Box::new(ScriptedStream {
            device: self.clone(),
            events: None,
        }))
    }
}

struct ScriptedStream {
    device: ScriptedDevice,
    events: Option<RecorderEvents>,
}

impl CaptureStream for ScriptedStream {
    fn start(&mut self, _encoding: Encoding, events: RecorderEvents) -> Result<(), DeviceError> {
        self.device.log.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.device.start_failure {
            return Err(err.clone());
        }
        for chunk in &self.device.chunks {
            let _ = events.send(RecorderEvent::Data(AudioChunk::new(chunk.clone())));
        }
        if let Some(failure) = &self.device.failure {
            let _ = events.send(RecorderEvent::Failed(failure.clone()));
        }
        self.events = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        self.device.log.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(events) = &self.events {
            if let Some(tail) = &self.device.tail {
                let _ = events.send(RecorderEvent::Data(AudioChunk::new(tail.clone())));
            }
            if self.device.acknowledge_stop {
                let _ = events.send(RecorderEvent::Stopped);
            }
        }
    }

    fn release(&mut self) {
        self.device.log.releases.fetch_add(1, Ordering::SeqCst);
        self.events = None;
    }
}

/// An identifier with a canned answer
pub struct ScriptedIdentifier {
    outcome: Result<MatchResult, IdentificationError>,
    delay: Option<StdDuration>,
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<Sample>>>,
}

impl ScriptedIdentifier {
    pub fn matching(song: &str, confidence: u64, offset: f64) -> Self {
        Self::with_outcome(Ok(
            MatchResult::new(song, confidence, offset).expect("valid match")
        ))
    }

    pub fn failing(error: IdentificationError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<MatchResult, IdentificationError>) -> Self {
        Self {
            outcome,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn delayed(mut self, delay: StdDuration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Identifier for ScriptedIdentifier {
    async fn identify(&self, sample: &Sample) -> Result<MatchResult, IdentificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(sample.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// A notifier that remembers what it was asked to show
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    pub shown: Arc<Mutex<Vec<(String, NotificationIcon)>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        _title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        self.shown.lock().unwrap().push((message.to_string(), icon));
        Ok(())
    }
}
