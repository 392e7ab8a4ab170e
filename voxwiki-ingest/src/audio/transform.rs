//! Audio transform seam
//!
//! Workflows depend on [`AudioTransform`] only, so tests (or a different codec
//! stack) can substitute their own implementation.

use crate::audio::decoder::decode_audio_file;
use crate::audio::encoder::{encode_mp3, encode_wav, EncodeOptions, OutputFormat};
use crate::audio::{AudioBuffer, AudioError, AudioResult};
use std::path::{Path, PathBuf};

/// Decode/encode collaborator
pub trait AudioTransform: Send + Sync {
    /// Decode any supported container to PCM
    fn decode(&self, path: &Path) -> AudioResult<AudioBuffer>;

    /// Encode PCM to the target container, returning the file bytes
    fn encode(&self, buffer: &AudioBuffer, options: &EncodeOptions) -> AudioResult<Vec<u8>>;
}

/// symphonia decoding, hound WAV encoding, ffmpeg MP3 encoding
#[derive(Debug, Clone, Default)]
pub struct SymphoniaTransform {
    ffmpeg: Option<PathBuf>,
}

impl SymphoniaTransform {
    /// Locate `ffmpeg` on PATH; MP3 encoding fails later if it is missing
    pub fn new() -> Self {
        let ffmpeg = which::which("ffmpeg").ok();
        match &ffmpeg {
            Some(path) => tracing::debug!(ffmpeg = %path.display(), "Found ffmpeg"),
            None => tracing::debug!("ffmpeg not found in PATH, MP3 output unavailable"),
        }
        Self { ffmpeg }
    }

    /// Whether MP3 output is possible
    pub fn supports(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Wav => true,
            OutputFormat::Mp3 => self.ffmpeg.is_some(),
        }
    }
}

impl AudioTransform for SymphoniaTransform {
    fn decode(&self, path: &Path) -> AudioResult<AudioBuffer> {
        decode_audio_file(path)
    }

    fn encode(&self, buffer: &AudioBuffer, options: &EncodeOptions) -> AudioResult<Vec<u8>> {
        match options.format {
            OutputFormat::Wav => encode_wav(buffer),
            OutputFormat::Mp3 => {
                let ffmpeg = self
                    .ffmpeg
                    .as_deref()
                    .ok_or_else(|| AudioError::EncoderNotFound("ffmpeg".to_string()))?;
                encode_mp3(buffer, &options.bitrate, ffmpeg)
            }
        }
    }
}

/// Decode `source`, encode it, and write the result to `destination`
pub fn convert_file(
    transform: &dyn AudioTransform,
    source: &Path,
    destination: &Path,
    options: &EncodeOptions,
) -> AudioResult<()> {
    let buffer = transform.decode(source)?;
    let bytes = transform.encode(&buffer, options)?;
    std::fs::write(destination, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp3_without_ffmpeg_is_encoder_not_found() {
        let transform = SymphoniaTransform { ffmpeg: None };
        assert!(!transform.supports(OutputFormat::Mp3));
        assert!(transform.supports(OutputFormat::Wav));

        let buffer = AudioBuffer::new(vec![0.0; 8], 8000, 1);
        let result = transform.encode(&buffer, &EncodeOptions::default());
        assert!(matches!(result, Err(AudioError::EncoderNotFound(_))));
    }

    #[test]
    fn test_convert_wav_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("in.wav");
        let destination = dir.path().join("out.wav");

        let transform = SymphoniaTransform { ffmpeg: None };
        let buffer = AudioBuffer::new((0..800).map(|i| (i as f32 / 100.0).sin() * 0.5).collect(), 8000, 1);
        let options = EncodeOptions {
            format: OutputFormat::Wav,
            bitrate: "192k".to_string(),
        };
        std::fs::write(&source, transform.encode(&buffer, &options).unwrap()).unwrap();

        convert_file(&transform, &source, &destination, &options).unwrap();

        let decoded = transform.decode(&destination).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.frames(), 800);
    }
}
