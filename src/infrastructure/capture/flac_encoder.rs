//! FLAC encoding of captured PCM
//!
//! Lossless and roughly half the size of WAV, which keeps uploads small
//! without touching the fingerprint.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use super::EncodingError;

const BITS_PER_SAMPLE: usize = 16;
const CHANNELS: usize = 1;

/// Encode mono 16-bit PCM at `sample_rate` into a FLAC stream
pub fn encode_to_flac(pcm: &[i16], sample_rate: u32) -> Result<Vec<u8>, EncodingError> {
    // flacenc works on i32
    let samples: Vec<i32> = pcm.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::Flac(format!("invalid config: {:?}", e)))?;

    let source = MemSource::from_samples(&samples, CHANNELS, BITS_PER_SAMPLE, sample_rate as usize);

    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::Flac(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| EncodingError::Flac(e.to_string()))?;

    Ok(sink.into_inner())
}
