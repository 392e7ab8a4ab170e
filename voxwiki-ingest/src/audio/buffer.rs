//! In-memory PCM buffers and the sample-level operations merge rendering needs

use crate::audio::resampler::Resampler;
use crate::audio::{AudioError, AudioResult};

/// Interleaved f32 PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples, nominal range [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Zero-length buffer in the given layout
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds, rounded down
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }
}

/// Digital silence of `duration_ms`
pub fn silence(duration_ms: u32, sample_rate: u32, channels: u16) -> AudioBuffer {
    let frames = duration_ms as u64 * sample_rate as u64 / 1000;
    AudioBuffer::new(
        vec![0.0; frames as usize * channels as usize],
        sample_rate,
        channels,
    )
}

/// Scale every sample by `10^(delta_db / 20)`
///
/// Samples are not clamped here; the encoder clamps when quantizing.
pub fn adjust_gain(buffer: &AudioBuffer, delta_db: f32) -> AudioBuffer {
    if delta_db == 0.0 {
        return buffer.clone();
    }

    let factor = 10f32.powf(delta_db / 20.0);
    AudioBuffer::new(
        buffer.samples.iter().map(|s| s * factor).collect(),
        buffer.sample_rate,
        buffer.channels,
    )
}

/// Convert `buffer` to the target channel count and sample rate
///
/// Mono is duplicated into every output channel; multi-channel input mixed
/// down to mono is averaged; other channel changes keep the first channels and
/// fill missing ones from the last available channel.
pub fn conform(buffer: &AudioBuffer, sample_rate: u32, channels: u16) -> AudioResult<AudioBuffer> {
    if buffer.channels == 0 || channels == 0 {
        return Err(AudioError::InvalidFormat("channel count must be non-zero".to_string()));
    }

    let remixed = remix_channels(buffer, channels);

    if remixed.sample_rate == sample_rate || remixed.is_empty() {
        return Ok(AudioBuffer::new(remixed.samples, sample_rate, channels));
    }

    let samples = Resampler::resample(&remixed.samples, remixed.sample_rate, sample_rate, channels)?;
    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

fn remix_channels(buffer: &AudioBuffer, channels: u16) -> AudioBuffer {
    let from = buffer.channels as usize;
    let to = channels as usize;
    if from == to {
        return buffer.clone();
    }

    let mut samples = Vec::with_capacity(buffer.frames() * to);
    for frame in buffer.samples.chunks_exact(from) {
        if to == 1 {
            samples.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            for ch in 0..to {
                samples.push(frame[ch.min(from - 1)]);
            }
        }
    }

    AudioBuffer::new(samples, buffer.sample_rate, channels)
}

/// Concatenate buffers into one track in the given output layout
pub fn concat(parts: &[AudioBuffer], sample_rate: u32, channels: u16) -> AudioResult<AudioBuffer> {
    let mut output = AudioBuffer::empty(sample_rate, channels);
    for part in parts {
        let conformed = conform(part, sample_rate, channels)?;
        output.samples.extend_from_slice(&conformed.samples);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length() {
        let buffer = silence(500, 44100, 2);
        assert_eq!(buffer.frames(), 22050);
        assert_eq!(buffer.samples.len(), 44100);
        assert!(buffer.samples.iter().all(|s| *s == 0.0));
        assert_eq!(buffer.duration_ms(), 500);
    }

    #[test]
    fn test_zero_silence() {
        assert!(silence(0, 48000, 1).is_empty());
    }

    #[test]
    fn test_adjust_gain_plus_six_db_roughly_doubles() {
        let buffer = AudioBuffer::new(vec![0.25, -0.25], 8000, 1);
        let louder = adjust_gain(&buffer, 6.0);
        assert!((louder.samples[0] - 0.4988).abs() < 0.001);
        assert!((louder.samples[1] + 0.4988).abs() < 0.001);
    }

    #[test]
    fn test_adjust_gain_zero_is_identity() {
        let buffer = AudioBuffer::new(vec![0.1, 0.2, 0.3], 8000, 1);
        assert_eq!(adjust_gain(&buffer, 0.0), buffer);
    }

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let buffer = AudioBuffer::new(vec![0.1, 0.2], 8000, 1);
        let stereo = conform(&buffer, 8000, 2).unwrap();
        assert_eq!(stereo.samples, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_stereo_to_mono_averages() {
        let buffer = AudioBuffer::new(vec![0.2, 0.4, -0.2, -0.4], 8000, 2);
        let mono = conform(&buffer, 8000, 1).unwrap();
        assert_eq!(mono.channels, 1);
        assert!((mono.samples[0] - 0.3).abs() < 1e-6);
        assert!((mono.samples[1] + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_concat_same_layout_appends() {
        let a = AudioBuffer::new(vec![0.1, 0.2], 8000, 1);
        let b = silence(1, 8000, 1);
        let joined = concat(&[a, b], 8000, 1).unwrap();
        assert_eq!(joined.samples, vec![0.1, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_concat_rejects_zero_channels() {
        let bad = AudioBuffer::new(vec![0.1], 8000, 0);
        assert!(concat(&[bad], 8000, 1).is_err());
    }
}
