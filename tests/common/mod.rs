//! Shared helpers for integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use audioprint::application::ports::{
    AudioDevice, CaptureStream, DeviceError, RecorderEvent, RecorderEvents,
};
use audioprint::domain::recording::{AudioChunk, Encoding};
use audioprint::infrastructure::capture::encode;

const SOURCE_RATE: u32 = 44_100;
const CHUNK_BYTES: usize = 4096;

/// A microphone that "hears" a tone and encodes it like the real adapter does
#[derive(Clone, Default)]
pub struct FakeMicrophone {
    pub denied: bool,
    pub wav_only: bool,
    pub releases: Arc<AtomicUsize>,
}

impl FakeMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::default()
        }
    }

    pub fn wav_only() -> Self {
        Self {
            wav_only: true,
            ..Self::default()
        }
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioDevice for FakeMicrophone {
    fn supports(&self, encoding: Encoding) -> bool {
        !self.wav_only || encoding == Encoding::Wav
    }

    async fn request_access(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        if self.denied {
            return Err(DeviceError::PermissionDenied("blocked by test".to_string()));
        }
        Ok(Box::new(FakeStream {
            releases: Arc::clone(&self.releases),
            encoding: None,
            events: None,
            released: false,
        }))
    }
}

struct FakeStream {
    releases: Arc<AtomicUsize>,
    encoding: Option<Encoding>,
    events: Option<RecorderEvents>,
    released: bool,
}

impl CaptureStream for FakeStream {
    fn start(&mut self, encoding: Encoding, events: RecorderEvents) -> Result<(), DeviceError> {
        self.encoding = Some(encoding);
        self.events = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        let (Some(encoding), Some(events)) = (self.encoding, self.events.as_ref()) else {
            return;
        };
        match encode(&tone(SOURCE_RATE as usize / 2), SOURCE_RATE, encoding) {
            Ok(bytes) => {
                for chunk in bytes.chunks(CHUNK_BYTES) {
                    let _ = events.send(RecorderEvent::Data(AudioChunk::new(chunk.to_vec())));
                }
                let _ = events.send(RecorderEvent::Stopped);
            }
            Err(e) => {
                let _ = events.send(RecorderEvent::Failed(e.to_string()));
            }
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.events = None;
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// 440 Hz sine, mono
pub fn tone(frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / SOURCE_RATE as f32;
            ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16
        })
        .collect()
}
