//! Error types for voxwiki-ingest
//!
//! Severity follows the run semantics:
//! - Recoverable, per clip: `UnrecognizedFilename`, `TransformFailure`,
//!   `RecognitionFailure` (reported, clip excluded, run continues)
//! - Recoverable, per entity: `EmptyResult` (reported, nothing written)
//! - Fatal: `MissingDirectory`, configuration errors

use crate::audio::AudioError;
use crate::services::file_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

/// Ingest error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Filename matches neither the voice-line nor the other-effect pattern
    #[error("Unrecognized filename: {0}")]
    UnrecognizedFilename(String),

    /// Decode/encode failed for one clip
    #[error("Transform failed for {path}: {source}")]
    TransformFailure {
        path: PathBuf,
        #[source]
        source: AudioError,
    },

    /// External speech recognizer failed for one clip
    #[error("Recognition failed for {path}: {message}")]
    RecognitionFailure { path: PathBuf, message: String },

    /// Input directory does not exist (aborts the run)
    #[error("Input directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// Nothing valid to merge for an entity
    #[error("No valid clips to merge for '{0}'")]
    EmptyResult(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory scan error
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking worker task panicked or was aborted
    #[error("Worker task failed: {0}")]
    Task(String),

    /// voxwiki-common error
    #[error("Common error: {0}")]
    Common(#[from] voxwiki_common::Error),
}

impl IngestError {
    /// Whether the run can continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IngestError::UnrecognizedFilename(_)
                | IngestError::TransformFailure { .. }
                | IngestError::RecognitionFailure { .. }
                | IngestError::EmptyResult(_)
        )
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(err: tokio::task::JoinError) -> Self {
        IngestError::Task(err.to_string())
    }
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;
