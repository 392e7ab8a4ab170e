//! Sample-rate conversion using rubato
//!
//! Clips recorded at different rates are brought to the mix rate before they
//! are concatenated into a merged track. Interpolation is polynomial
//! (`FastFixedIn`, septic), not sinc.

use crate::audio::{AudioError, AudioResult};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Whole-buffer resampler
pub struct Resampler;

impl Resampler {
    /// Resample interleaved audio from `input_rate` to `output_rate`
    ///
    /// The whole clip is processed as a single chunk; voice clips are a few
    /// seconds long so there is no need to stream.
    pub fn resample(
        input: &[f32],
        input_rate: u32,
        output_rate: u32,
        channels: u16,
    ) -> AudioResult<Vec<f32>> {
        if input_rate == output_rate || input.is_empty() {
            return Ok(input.to_vec());
        }
        if channels == 0 || input_rate == 0 || output_rate == 0 {
            return Err(AudioError::Resample(format!(
                "invalid layout: {} Hz -> {} Hz, {} channels",
                input_rate, output_rate, channels
            )));
        }

        debug!(
            "Resampling from {}Hz to {}Hz ({} channels)",
            input_rate, output_rate, channels
        );

        let planar_input = Self::deinterleave(input, channels);
        let input_frames = planar_input[0].len();

        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input_frames,
            channels as usize,
        )
        .map_err(|e| AudioError::Resample(format!("Failed to create resampler: {}", e)))?;

        let planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| AudioError::Resample(format!("Resampling failed: {}", e)))?;

        Ok(Self::interleave(planar_output))
    }

    /// `[L, R, L, R, ...]` → `[[L, L, ...], [R, R, ...]]`
    fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
        let num_channels = channels as usize;
        let num_frames = samples.len() / num_channels;
        let mut planar = vec![Vec::with_capacity(num_frames); num_channels];

        for frame in samples.chunks_exact(num_channels) {
            for (ch, sample) in frame.iter().enumerate() {
                planar[ch].push(*sample);
            }
        }

        planar
    }

    /// `[[L, L, ...], [R, R, ...]]` → `[L, R, L, R, ...]`
    fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
        let Some(first) = planar.first() else {
            return Vec::new();
        };

        let num_frames = first.len();
        let mut interleaved = Vec::with_capacity(num_frames * planar.len());
        for frame_idx in 0..num_frames {
            for channel in &planar {
                interleaved.push(channel[frame_idx]);
            }
        }

        interleaved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let planar = Resampler::deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2);
        assert_eq!(planar, vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]);
    }

    #[test]
    fn test_interleave() {
        let interleaved = Resampler::interleave(vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
        assert_eq!(interleaved, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_same_rate_is_copy() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        let output = Resampler::resample(&input, 44100, 44100, 2).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_upsample_roughly_doubles_length() {
        let input: Vec<f32> = (0..2205).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = Resampler::resample(&input, 22050, 44100, 1).unwrap();
        let expected = input.len() * 2;
        let tolerance = expected / 20;
        assert!(
            output.len() + tolerance >= expected && output.len() <= expected + tolerance,
            "got {} samples, expected about {}",
            output.len(),
            expected
        );
    }

    #[test]
    fn test_upsampled_tone_keeps_its_level() {
        let rate = 22050.0;
        let input: Vec<f32> = (0..4410)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate).sin())
            .collect();
        let output = Resampler::resample(&input, 22050, 44100, 1).unwrap();

        let middle = &output[output.len() / 4..output.len() * 3 / 4];
        let rms = (middle.iter().map(|s| s * s).sum::<f32>() / middle.len() as f32).sqrt();
        // A 0.5 peak sine has an RMS of about 0.354
        assert!((0.30..0.40).contains(&rms), "rms {}", rms);
    }
}
