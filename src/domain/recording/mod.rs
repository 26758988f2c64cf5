//! Recording domain module

mod duration;
mod encoding;
mod sample;

pub use duration::{Duration, DEFAULT_REQUEST_TIMEOUT_SECS, RECORDING_CEILING_SECS};
pub use encoding::Encoding;
pub use sample::{AudioChunk, Sample};
