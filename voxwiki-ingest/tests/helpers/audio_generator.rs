//! Audio Test Fixture Generator
//!
//! Writes short 16-bit WAV clips with hound

use std::path::{Path, PathBuf};

/// Configuration for a generated clip
#[derive(Debug, Clone)]
pub struct ClipConfig {
    pub duration_ms: u32,
    pub sample_rate: u32,
    pub channels: u16,
    /// Tone frequency in Hz, 0 writes silence
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            sample_rate: 44100,
            channels: 2,
            frequency: 440.0,
            amplitude: 0.3,
        }
    }
}

/// Generate one WAV clip
pub fn generate_test_wav(path: &Path, config: &ClipConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = config.duration_ms as u64 * config.sample_rate as u64 / 1000;

    for i in 0..frames {
        let t = i as f32 / config.sample_rate as f32;
        let value = config.amplitude * (2.0 * std::f32::consts::PI * config.frequency * t).sin();
        let sample = (value * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Generate one clip per file name in `dir`
pub fn generate_clip_set(
    dir: &Path,
    names: &[&str],
    config: &ClipConfig,
) -> anyhow::Result<Vec<PathBuf>> {
    names
        .iter()
        .map(|name| generate_test_wav(&dir.join(name), config))
        .collect()
}

/// Duration of a WAV file in milliseconds
pub fn wav_duration_ms(path: &Path) -> anyhow::Result<u64> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    Ok(reader.duration() as u64 * 1000 / spec.sample_rate as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_clip_length() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.wav");

        generate_test_wav(&path, &ClipConfig::default()).unwrap();
        assert_eq!(wav_duration_ms(&path).unwrap(), 200);
    }
}
