//! In-memory WAV encoding

use std::io::Cursor;

use super::EncodingError;

/// Encode mono 16-bit PCM into a RIFF/WAVE buffer
pub fn encode_to_wav(pcm: &[i16], sample_rate: u32) -> Result<Vec<u8>, EncodingError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| EncodingError::Wav(e.to_string()))?;
        for &sample in pcm {
            writer
                .write_sample(sample)
                .map_err(|e| EncodingError::Wav(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| EncodingError::Wav(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
