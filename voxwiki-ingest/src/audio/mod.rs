//! Audio transform collaborator
//!
//! The classification core never touches samples; it only calls through
//! [`AudioTransform`] plus the buffer operations in [`buffer`]:
//! - `decode(path) -> AudioBuffer` (symphonia)
//! - `encode(&AudioBuffer, &EncodeOptions) -> bytes` (hound WAV, ffmpeg MP3)
//! - `adjust_gain`, `silence`, `concat` (pure sample math, rubato resampling)

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod resampler;
pub mod transform;

pub use buffer::AudioBuffer;
pub use encoder::{EncodeOptions, OutputFormat};
pub use transform::{convert_file, AudioTransform, SymphoniaTransform};

use thiserror::Error;

/// Audio collaborator errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// Container/codec could not be opened or decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Encoding to the target format failed
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Sample-rate conversion failed
    #[error("Resampling error: {0}")]
    Resample(String),

    /// External encoder executable missing from PATH
    #[error("{0} not found in PATH")]
    EncoderNotFound(String),

    /// Buffers with incompatible layout
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AudioResult<T> = Result<T, AudioError>;
