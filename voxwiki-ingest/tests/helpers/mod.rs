//! Test Helper Utilities
//!
//! Shared fixtures for voxwiki-ingest integration tests

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{generate_clip_set, generate_test_wav, ClipConfig};

use std::path::Path;
use voxwiki_ingest::audio::OutputFormat;
use voxwiki_ingest::IngestConfig;

/// Config for WAV fixtures in, WAV clips out (no ffmpeg needed)
pub fn wav_config() -> IngestConfig {
    let mut config = IngestConfig::default();
    config.scan.extensions = vec!["wav".to_string()];
    config.output.format = OutputFormat::Wav;
    config.output.audio_dir = "audio".to_string();
    config
}

/// Write a file that is not audio at all
pub fn write_garbage(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"this is not a wav file").unwrap();
}
