//! Audio capture infrastructure
//!
//! Records from the default input device with cpal, mixes to mono,
//! resamples to the rate the fingerprint service works at and encodes
//! the result as FLAC or WAV.

mod cpal_device;
mod flac_encoder;
mod pcm;
mod wav_encoder;

pub use cpal_device::{CpalCaptureStream, CpalDevice};
pub use flac_encoder::encode_to_flac;
pub use wav_encoder::encode_to_wav;

use crate::domain::recording::Encoding;

/// Sample rate of every uploaded recording
pub const TARGET_SAMPLE_RATE: u32 = 22_050;

/// Encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("FLAC encoding failed: {0}")]
    Flac(String),

    #[error("WAV encoding failed: {0}")]
    Wav(String),
}

/// Resample mono PCM captured at `source_rate` and encode it
pub fn encode(pcm: &[i16], source_rate: u32, encoding: Encoding) -> Result<Vec<u8>, EncodingError> {
    let resampled = pcm::resample(pcm, source_rate, TARGET_SAMPLE_RATE)?;
    match encoding {
        Encoding::Flac => encode_to_flac(&resampled, TARGET_SAMPLE_RATE),
        Encoding::Wav => encode_to_wav(&resampled, TARGET_SAMPLE_RATE),
    }
}
