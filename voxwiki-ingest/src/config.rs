//! Configuration for the voxwiki tools
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (`VOXWIKI_*`, resolved by clap)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! Every section is optional in the TOML file; absent keys take the built-in
//! default. The vocabulary tables live here too, so adding a voice trigger or
//! an effect label never needs a code change.

use crate::audio::{EncodeOptions, OutputFormat};
use crate::error::{IngestError, IngestResult};
use crate::models::Vocabulary;
use crate::services::merge_planner::{MergeProfile, MergeTiming, DEFAULT_SECONDARY_GAIN_DB};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use voxwiki_common::config::{load_toml_config, resolve_config_path, LoggingConfig, CONFIG_ENV_VAR};

/// Config file stem under the platform config directory
pub const CONFIG_FILE_STEM: &str = "voxwiki";

/// Complete tool configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub scan: ScanConfig,
    pub vocabulary: Vocabulary,
    pub merge: MergeConfig,
    pub conversion: ConversionConfig,
    pub xor: XorConfig,
    pub transcribe: TranscribeConfig,
}

/// Output naming and encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Fixed file name prefix (`BS_<entity>_...`)
    pub prefix: String,
    pub format: OutputFormat,
    /// ffmpeg bitrate for MP3 output
    pub bitrate: String,
    /// Wiki template name in transcript lines
    pub template: String,
    /// Subdirectory of the output directory for converted clips
    pub audio_dir: String,
    /// Output directory name under the input directory when none is given
    pub dir_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "BS".to_string(),
            format: OutputFormat::Mp3,
            bitrate: "192k".to_string(),
            template: "BSAudio".to_string(),
            audio_dir: "mp3".to_string(),
            dir_name: "output".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            format: self.format,
            bitrate: self.bitrate.clone(),
        }
    }

    /// `<input>/<dir_name>` unless an explicit output directory is given
    pub fn resolve_dir(&self, input: &Path, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.join(&self.dir_name))
    }
}

/// Input directory scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Accepted clip extensions, compared case-insensitively
    pub extensions: Vec<String>,
    /// Traversal depth, 1 = top level only, 0 = unlimited
    pub max_depth: usize,
    /// Check file signatures before classification
    pub verify_magic: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["ogg".to_string()],
            max_depth: 1,
            verify_magic: false,
        }
    }
}

impl ScanConfig {
    pub fn depth_limit(&self) -> Option<usize> {
        (self.max_depth > 0).then_some(self.max_depth)
    }
}

/// Bilingual merge timing and mix format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub profile: MergeProfile,
    /// Overrides the profile's Primary gap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_gap_ms: Option<u32>,
    /// Overrides the profile's Secondary gap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_gap_ms: Option<u32>,
    /// Gap after a clip whose slot has no other-language companion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpaired_gap_ms: Option<u32>,
    pub secondary_gain_db: f32,
    /// Mix sample rate, every clip is resampled to it
    pub sample_rate: u32,
    /// Mix channel count
    pub channels: u16,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            profile: MergeProfile::Mixed,
            primary_gap_ms: None,
            secondary_gap_ms: None,
            unpaired_gap_ms: None,
            secondary_gain_db: DEFAULT_SECONDARY_GAIN_DB,
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

impl MergeConfig {
    /// Profile gaps with explicit values applied on top
    pub fn timing(&self) -> MergeTiming {
        let profile = MergeTiming::for_profile(self.profile);
        MergeTiming {
            primary_gap_ms: self.primary_gap_ms.unwrap_or(profile.primary_gap_ms),
            secondary_gap_ms: self.secondary_gap_ms.unwrap_or(profile.secondary_gap_ms),
            unpaired_gap_ms: self.unpaired_gap_ms,
            secondary_gain_db: self.secondary_gain_db,
        }
    }
}

/// Clip conversion pool and the prefix-convert workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Concurrent codec transforms, 1 = sequential
    pub max_parallel: usize,
    /// Source extensions for `voxwiki convert`
    pub extensions: Vec<String>,
    /// Prepended to every converted file name by `voxwiki convert`
    pub prefix: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            extensions: vec!["wav".to_string()],
            prefix: String::new(),
        }
    }
}

/// Byte-group XOR toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XorConfig {
    pub key: u8,
    /// Only the first byte of every group is toggled
    pub group_size: usize,
    /// Rewrite in place, otherwise write `<name>_decrypted`
    pub overwrite: bool,
}

impl Default for XorConfig {
    fn default() -> Self {
        Self {
            key: 0x01,
            group_size: 4,
            overwrite: true,
        }
    }
}

/// External speech recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeConfig {
    /// Recognizer executable (path or name on PATH)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Arguments; `{input}` is replaced by the clip path
    pub args: Vec<String>,
    /// Separator line after every N processed clips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    pub extensions: Vec<String>,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: vec!["{input}".to_string()],
            batch_size: None,
            extensions: ["wav", "mp3", "flac", "m4a", "ogg"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl IngestConfig {
    /// Load from `--config`, `$VOXWIKI_CONFIG`, or the platform default
    ///
    /// A missing file yields the built-in defaults.
    pub fn load(cli_path: Option<&Path>) -> IngestResult<Self> {
        let config = match resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_STEM) {
            Some(path) => load_toml_config::<IngestConfig>(&path)?,
            None => {
                tracing::warn!("No config directory available, using built-in defaults");
                IngestConfig::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but an unreadable or invalid file gives
    /// the defaults (with a warning) instead of an error
    pub fn load_or_default(cli_path: Option<&Path>) -> Self {
        Self::load(cli_path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring current configuration: {}", e);
            IngestConfig::default()
        })
    }

    /// Reject values no workflow can run with
    pub fn validate(&self) -> IngestResult<()> {
        self.vocabulary.validate().map_err(IngestError::Config)?;

        if self.scan.extensions.is_empty() {
            return Err(IngestError::Config("scan.extensions is empty".to_string()));
        }
        if self.conversion.max_parallel == 0 {
            return Err(IngestError::Config(
                "conversion.max_parallel must be at least 1".to_string(),
            ));
        }
        if self.merge.sample_rate == 0 || self.merge.channels == 0 {
            return Err(IngestError::Config(format!(
                "invalid mix format: {} Hz, {} channels",
                self.merge.sample_rate, self.merge.channels
            )));
        }
        if !self.merge.secondary_gain_db.is_finite() {
            return Err(IngestError::Config(
                "merge.secondary_gain_db must be finite".to_string(),
            ));
        }
        if self.xor.group_size == 0 {
            return Err(IngestError::Config("xor.group_size must be at least 1".to_string()));
        }
        if self.transcribe.batch_size == Some(0) {
            return Err(IngestError::Config(
                "transcribe.batch_size must be at least 1".to_string(),
            ));
        }
        if self.output.audio_dir.trim().is_empty() || self.output.dir_name.trim().is_empty() {
            return Err(IngestError::Config(
                "output.audio_dir and output.dir_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
