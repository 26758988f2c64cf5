//! Audio capture port interfaces

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::recording::{AudioChunk, Encoding};

/// Errors from acquiring or starting a capture device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("No audio input device available: {0}")]
    Unavailable(String),
}

/// Messages a recorder sends while it runs.
///
/// Chunks arrive in production order. After `stop` is requested the recorder
/// flushes any remaining data and then sends `Stopped` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    Data(AudioChunk),
    Stopped,
    Failed(String),
}

/// Sending side of a recorder's event channel
pub type RecorderEvents = mpsc::UnboundedSender<RecorderEvent>;

/// Port for the host's audio capture capability
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Whether this runtime can record in the given encoding
    fn supports(&self, encoding: Encoding) -> bool;

    /// Request exclusive access to an input device.
    ///
    /// # Returns
    /// An open stream, or `PermissionDenied` / `Unavailable`
    async fn request_access(&self) -> Result<Box<dyn CaptureStream>, DeviceError>;
}

/// An open input stream holding the physical device.
///
/// Implementations must also release the device when dropped.
pub trait CaptureStream: Send + Sync {
    /// Begin recording; events are delivered through `events`
    fn start(&mut self, encoding: Encoding, events: RecorderEvents) -> Result<(), DeviceError>;

    /// Ask the recorder to stop. Remaining data and the acknowledgment arrive as events.
    fn stop(&mut self);

    /// Close the stream and give the device back to the OS
    fn release(&mut self);
}
