//! Audio encoding
//!
//! - WAV: 16-bit PCM via hound, in process
//! - MP3: the `ffmpeg` executable, fed WAV on stdin, MP3 read from stdout

use crate::audio::{AudioBuffer, AudioError, AudioResult};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Target container/codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp3,
    Wav,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(OutputFormat::Mp3),
            "wav" => Ok(OutputFormat::Wav),
            other => Err(format!("unsupported output format '{}' (expected mp3 or wav)", other)),
        }
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub format: OutputFormat,
    /// ffmpeg-style bitrate (`192k`); ignored for WAV
    pub bitrate: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mp3,
            bitrate: "192k".to_string(),
        }
    }
}

/// Encode as 16-bit PCM WAV, clamping to [-1.0, 1.0]
pub fn encode_wav(buffer: &AudioBuffer) -> AudioResult<Vec<u8>> {
    if buffer.channels == 0 || buffer.sample_rate == 0 {
        return Err(AudioError::InvalidFormat(format!(
            "cannot encode {} channels at {} Hz",
            buffer.channels, buffer.sample_rate
        )));
    }

    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AudioError::Encode(format!("WAV header: {}", e)))?;
        for sample in &buffer.samples {
            let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| AudioError::Encode(format!("WAV sample: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::Encode(format!("WAV finalize: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

/// Encode as MP3 through ffmpeg
///
/// Input is piped as WAV so ffmpeg needs no knowledge of our sample layout.
pub fn encode_mp3(buffer: &AudioBuffer, bitrate: &str, ffmpeg: &Path) -> AudioResult<Vec<u8>> {
    let wav = encode_wav(buffer)?;

    debug!(
        ffmpeg = %ffmpeg.display(),
        bitrate,
        input_bytes = wav.len(),
        "Encoding MP3"
    );

    let mut child = Command::new(ffmpeg)
        .args(["-hide_banner", "-v", "error", "-f", "wav", "-i", "pipe:0"])
        .args(["-codec:a", "libmp3lame", "-b:a", bitrate, "-f", "mp3", "pipe:1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| AudioError::Encode("ffmpeg stdin unavailable".to_string()))?;

    // Feed stdin from a separate thread so a full stdout pipe cannot deadlock us
    let writer = std::thread::spawn(move || stdin.write_all(&wav));

    let output = child.wait_with_output()?;

    match writer.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Ok(Err(e)) => return Err(AudioError::Io(e)),
        Err(_) => return Err(AudioError::Encode("ffmpeg stdin writer panicked".to_string())),
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AudioError::Encode(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    if output.stdout.is_empty() {
        return Err(AudioError::Encode("ffmpeg produced no output".to_string()));
    }

    Ok(output.stdout)
}
