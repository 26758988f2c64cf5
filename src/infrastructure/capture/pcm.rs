//! PCM helpers: channel mixing, sample conversion and resampling

use rubato::{FftFixedIn, Resampler};

use super::EncodingError;

/// Mix interleaved multi-channel samples down to mono
pub fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Convert float samples in [-1.0, 1.0] to 16-bit
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

/// Resample mono audio from `source_rate` to `target_rate`
pub fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Result<Vec<i16>, EncodingError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let input: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (input.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| EncodingError::Resample(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut position = 0;

    while position < input.len() {
        let frames_needed = resampler.input_frames_next();
        let end = (position + frames_needed).min(input.len());

        let mut frame = input[position..end].to_vec();
        // Last block is zero padded
        frame.resize(frames_needed, 0.0);
        let block = vec![frame];

        let resampled = resampler
            .process(&block, None)
            .map_err(|e| EncodingError::Resample(format!("Resampling failed: {}", e)))?;

        output.extend(
            resampled[0]
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16),
        );
        position = end;
    }

    output.truncate(output_len);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_input_is_unchanged() {
        let mono = vec![100i16, 200, 300];
        assert_eq!(mix_to_mono(&mono, 1), mono);
    }

    #[test]
    fn stereo_is_averaged() {
        let stereo = vec![100i16, 200, 300, 400];
        assert_eq!(mix_to_mono(&stereo, 2), vec![150, 350]);
    }

    #[test]
    fn float_samples_are_clamped() {
        assert_eq!(f32_to_i16(&[0.0, 1.0, -1.0, 2.0]), vec![0, 32767, -32767, 32767]);
    }

    #[test]
    fn same_rate_is_passthrough() {
        let samples = vec![1i16, 2, 3];
        assert_eq!(resample(&samples, 22_050, 22_050).unwrap(), samples);
    }

    #[test]
    fn downsampling_halves_length() {
        let samples = vec![0i16; 44_100];
        let output = resample(&samples, 44_100, 22_050).unwrap();
        assert_eq!(output.len(), 22_050);
    }
}
