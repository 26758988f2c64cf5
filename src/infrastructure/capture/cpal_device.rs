//! Microphone capture using cpal
//!
//! `cpal::Stream` is not `Send`, so each acquisition gets its own thread that
//! owns the stream for its whole life. The async side talks to it over a
//! control channel and receives recorder events back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::pcm::{f32_to_i16, mix_to_mono};
use super::TARGET_SAMPLE_RATE;
use crate::application::ports::{
    AudioDevice, CaptureStream, DeviceError, RecorderEvent, RecorderEvents,
};
use crate::domain::recording::{AudioChunk, Encoding};

/// Encoded output is handed over in pieces of this size
const CHUNK_BYTES: usize = 16 * 1024;

enum Control {
    Start {
        encoding: Encoding,
        events: RecorderEvents,
    },
    Stop,
    Fault(String),
    Release,
}

#[derive(Debug, Clone, Copy)]
struct StreamFormat {
    sample_rate: u32,
    channels: u16,
}

/// The host's default input device
#[derive(Debug, Clone, Default)]
pub struct CpalDevice;

impl CpalDevice {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioDevice for CpalDevice {
    fn supports(&self, encoding: Encoding) -> bool {
        Encoding::ALL.contains(&encoding)
    }

    async fn request_access(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (control_tx, control_rx) = std_mpsc::channel();
        let faults = control_tx.clone();

        let worker = thread::Builder::new()
            .name("audioprint-capture".to_string())
            .spawn(move || capture_thread(control_rx, faults, ready_tx))
            .map_err(|e| DeviceError::Unavailable(format!("Failed to spawn capture thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(format)) => {
                info!(
                    sample_rate = format.sample_rate,
                    channels = format.channels,
                    "Microphone acquired"
                );
                Ok(Box::new(CpalCaptureStream {
                    control: control_tx,
                    worker: Some(worker),
                }))
            }
            Ok(Err(err)) => {
                let _ = worker.join();
                Err(err)
            }
            Err(_) => {
                let _ = worker.join();
                Err(DeviceError::Unavailable("Capture thread exited early".into()))
            }
        }
    }
}

/// An open cpal input stream, owned by its capture thread
pub struct CpalCaptureStream {
    control: std_mpsc::Sender<Control>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureStream for CpalCaptureStream {
    fn start(&mut self, encoding: Encoding, events: RecorderEvents) -> Result<(), DeviceError> {
        self.control
            .send(Control::Start { encoding, events })
            .map_err(|_| DeviceError::Unavailable("Capture thread is not running".into()))
    }

    fn stop(&mut self) {
        if self.control.send(Control::Stop).is_err() {
            debug!("Stop sent to a finished capture thread");
        }
    }

    fn release(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.control.send(Control::Release);
        join_capture_thread(worker);
    }
}

/// Wait for the capture thread to exit without stalling the async runtime.
///
/// Inside a runtime the join moves to the blocking pool, otherwise it happens
/// on the calling thread.
fn join_capture_thread(worker: JoinHandle<()>) {
    let wait = move || {
        if worker.join().is_err() {
            warn!("Capture thread panicked");
        }
    };
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(wait);
        }
        Err(_) => wait(),
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.release();
    }
}

fn capture_thread(
    control: std_mpsc::Receiver<Control>,
    faults: std_mpsc::Sender<Control>,
    ready: oneshot::Sender<Result<StreamFormat, DeviceError>>,
) {
    let buffer = Arc::new(StdMutex::new(Vec::<i16>::new()));
    let capturing = Arc::new(AtomicBool::new(false));

    let (stream, format) = match open_stream(Arc::clone(&buffer), Arc::clone(&capturing), faults) {
        Ok(opened) => opened,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    if ready.send(Ok(format)).is_err() {
        return;
    }

    let mut active: Option<(Encoding, RecorderEvents)> = None;
    let mut fault: Option<String> = None;

    while let Ok(message) = control.recv() {
        match message {
            Control::Start { encoding, events } => {
                if let Some(message) = fault.take() {
                    let _ = events.send(RecorderEvent::Failed(message));
                    continue;
                }
                if let Ok(mut samples) = buffer.lock() {
                    samples.clear();
                }
                capturing.store(true, Ordering::SeqCst);
                active = Some((encoding, events));
                debug!(encoding = %encoding, "Capture started");
            }
            Control::Stop => {
                capturing.store(false, Ordering::SeqCst);
                if let Some((encoding, events)) = active.take() {
                    flush(&buffer, format, encoding, &events);
                }
            }
            Control::Fault(message) => {
                warn!(error = %message, "Audio stream error");
                capturing.store(false, Ordering::SeqCst);
                match active.take() {
                    Some((_, events)) => {
                        let _ = events.send(RecorderEvent::Failed(message));
                    }
                    None => fault = Some(message),
                }
            }
            Control::Release => break,
        }
    }

    capturing.store(false, Ordering::SeqCst);
    drop(stream);
    debug!("Microphone released");
}

/// Encode everything captured and hand it to the session, then acknowledge
fn flush(buffer: &StdMutex<Vec<i16>>, format: StreamFormat, encoding: Encoding, events: &RecorderEvents) {
    let pcm = buffer
        .lock()
        .map(|mut samples| std::mem::take(&mut *samples))
        .unwrap_or_default();

    if pcm.is_empty() {
        warn!("No audio frames were captured");
    } else {
        match super::encode(&pcm, format.sample_rate, encoding) {
            Ok(bytes) => {
                debug!(frames = pcm.len(), bytes = bytes.len(), "Encoded recording");
                for part in bytes.chunks(CHUNK_BYTES) {
                    let _ = events.send(RecorderEvent::Data(AudioChunk::new(part.to_vec())));
                }
            }
            Err(err) => {
                let _ = events.send(RecorderEvent::Failed(err.to_string()));
                return;
            }
        }
    }

    let _ = events.send(RecorderEvent::Stopped);
}

fn open_stream(
    buffer: Arc<StdMutex<Vec<i16>>>,
    capturing: Arc<AtomicBool>,
    faults: std_mpsc::Sender<Control>,
) -> Result<(cpal::Stream, StreamFormat), DeviceError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| DeviceError::Unavailable("No default input device".into()))?;

    let (config, sample_format) = input_config(&device)?;
    let format = StreamFormat {
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    };
    let channels = format.channels;

    let on_error = move |err: cpal::StreamError| {
        let _ = faults.send(Control::Fault(err.to_string()));
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if capturing.load(Ordering::SeqCst) {
                    let mono = mix_to_mono(data, channels);
                    if let Ok(mut samples) = buffer.lock() {
                        samples.extend_from_slice(&mono);
                    }
                }
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if capturing.load(Ordering::SeqCst) {
                    let mono = mix_to_mono(&f32_to_i16(data), channels);
                    if let Ok(mut samples) = buffer.lock() {
                        samples.extend_from_slice(&mono);
                    }
                }
            },
            on_error,
            None,
        ),
        other => {
            return Err(DeviceError::Unavailable(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| classify(e.to_string()))?;

    stream.play().map_err(|e| classify(e.to_string()))?;
    Ok((stream, format))
}

/// Pick an i16 or f32 input config, preferring fewer channels and the target rate
fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), DeviceError> {
    let supported = device
        .supported_input_configs()
        .map_err(|e| classify(e.to_string()))?;

    let includes_target = |range: &cpal::SupportedStreamConfigRange| {
        range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
            && range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
    };

    let mut best: Option<cpal::SupportedStreamConfigRange> = None;
    for range in supported {
        if range.sample_format() != SampleFormat::I16 && range.sample_format() != SampleFormat::F32 {
            continue;
        }
        let better = match &best {
            None => true,
            Some(current) => {
                range.channels() < current.channels()
                    || (includes_target(&range) && !includes_target(current))
            }
        };
        if better {
            best = Some(range);
        }
    }

    let range = best.ok_or_else(|| DeviceError::Unavailable("No usable input config".into()))?;
    let sample_rate = if includes_target(&range) {
        SampleRate(TARGET_SAMPLE_RATE)
    } else {
        range.max_sample_rate()
    };

    let config = StreamConfig {
        channels: range.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };
    Ok((config, range.sample_format()))
}

/// Tell a permission problem apart from a missing or broken device
fn classify(message: String) -> DeviceError {
    let lower = message.to_lowercase();
    let denied = ["permission", "denied", "not authorized", "not permitted"]
        .iter()
        .any(|needle| lower.contains(needle));
    if denied {
        DeviceError::PermissionDenied(message)
    } else {
        DeviceError::Unavailable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn parked_worker() -> (JoinHandle<()>, std_mpsc::Sender<()>, Arc<AtomicBool>) {
        let (wake_tx, wake_rx) = std_mpsc::channel::<()>();
        let exited = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&exited);
        let worker = thread::spawn(move || {
            let _ = wake_rx.recv();
            flag.store(true, Ordering::SeqCst);
        });
        (worker, wake_tx, exited)
    }

    #[tokio::test]
    async fn joining_inside_runtime_does_not_block_it() {
        let (worker, wake, exited) = parked_worker();

        join_capture_thread(worker);
        // Still running on the runtime thread while the worker is parked
        assert!(!exited.load(Ordering::SeqCst));

        wake.send(()).unwrap();
        tokio::time::timeout(StdDuration::from_secs(5), async {
            while !exited.load(Ordering::SeqCst) {
                tokio::time::sleep(StdDuration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn joining_outside_runtime_waits_for_exit() {
        let (worker, wake, exited) = parked_worker();

        wake.send(()).unwrap();
        join_capture_thread(worker);
        assert!(exited.load(Ordering::SeqCst));
    }

    #[test]
    fn permission_messages_are_denials() {
        assert!(matches!(
            classify("Permission denied (os error 13)".into()),
            DeviceError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify("Microphone access not authorized".into()),
            DeviceError::PermissionDenied(_)
        ));
    }

    #[test]
    fn other_messages_mean_unavailable() {
        assert!(matches!(
            classify("The requested device is no longer available".into()),
            DeviceError::Unavailable(_)
        ));
    }

    #[test]
    fn device_supports_both_encodings() {
        let device = CpalDevice::new();
        assert!(device.supports(Encoding::Flac));
        assert!(device.supports(Encoding::Wav));
    }

    #[test]
    fn flush_without_audio_only_acknowledges() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let buffer = StdMutex::new(Vec::new());
        let format = StreamFormat {
            sample_rate: TARGET_SAMPLE_RATE,
            channels: 1,
        };

        flush(&buffer, format, Encoding::Wav, &tx);

        assert_eq!(rx.try_recv().unwrap(), RecorderEvent::Stopped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn flush_emits_encoded_audio_then_acknowledges() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let buffer = StdMutex::new(vec![0i16; 2205]);
        let format = StreamFormat {
            sample_rate: TARGET_SAMPLE_RATE,
            channels: 1,
        };

        flush(&buffer, format, Encoding::Wav, &tx);

        match rx.try_recv().unwrap() {
            RecorderEvent::Data(chunk) => assert_eq!(&chunk.data()[0..4], b"RIFF"),
            other => panic!("expected data, got {:?}", other),
        }
        assert_eq!(rx.try_recv().unwrap(), RecorderEvent::Stopped);
        assert!(buffer.lock().unwrap().is_empty());
    }
}
