//! Batch transcription workflow
//!
//! Runs the recognizer over every clip of a directory and appends one line of
//! text per clip to a single UTF-8 file. Clips named by number (`1.wav`,
//! `2.wav`, `10.wav`) are processed in numeric order.

use crate::config::TranscribeConfig;
use crate::error::{IngestError, IngestResult};
use crate::services::{FileScanner, ScanError, Transcriber};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Written after every `batch_size` processed clips
pub const BATCH_SEPARATOR: &str = "==============";

/// Transcription summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranscriptionReport {
    pub processed: usize,
    /// Clips that produced a non-empty line
    pub lines: usize,
    pub empty: usize,
    pub failed: Vec<String>,
    pub separators: usize,
}

/// Numeric order when every stem is a number, file-name order otherwise
pub fn order_clips(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
    fn numeric_stem(path: &Path) -> Option<u64> {
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        stem.parse().ok()
    }

    let numbers: Option<Vec<u64>> = files.iter().map(|p| numeric_stem(p)).collect();
    match numbers {
        Some(_) => files.sort_by_key(|p| (numeric_stem(p), p.file_name().map(|n| n.to_os_string()))),
        None => files.sort_by(|a, b| a.file_name().cmp(&b.file_name())),
    }
    files
}

/// Transcribe every clip of `input` into `output`
///
/// The output file is flushed after every line, so a partial run leaves every
/// finished line on disk.
///
/// # Errors
/// `MissingDirectory` for a missing input, I/O errors on the output file.
/// Recognizer failures are logged and reported per clip.
pub fn transcribe_directory(
    input: &Path,
    output: &Path,
    transcriber: &dyn Transcriber,
    config: &TranscribeConfig,
) -> IngestResult<TranscriptionReport> {
    let files = FileScanner::new(&config.extensions)
        .scan(input)
        .map_err(|e| match e {
            ScanError::PathNotFound(path) | ScanError::NotADirectory(path) => {
                IngestError::MissingDirectory(path)
            }
            other => IngestError::Scan(other),
        })?;
    let files = order_clips(files);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut out = File::create(output)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        clips = files.len(),
        "Starting transcription"
    );

    let mut report = TranscriptionReport::default();
    for (position, path) in files.iter().enumerate() {
        match transcriber.transcribe(path) {
            Ok(text) if !text.trim().is_empty() => {
                writeln!(out, "{}", text.trim())?;
                out.flush()?;
                report.lines += 1;
                tracing::info!(file = %path.display(), text = %text.trim(), "Transcribed");
            }
            Ok(_) => {
                report.empty += 1;
                tracing::debug!(file = %path.display(), "No speech recognized");
            }
            Err(e) => {
                tracing::warn!("Skipping clip: {}", e);
                report.failed.push(path.display().to_string());
            }
        }
        report.processed += 1;

        if let Some(batch) = config.batch_size.filter(|b| *b > 0) {
            if (position + 1) % batch == 0 {
                writeln!(out, "{}", BATCH_SEPARATOR)?;
                out.flush()?;
                report.separators += 1;
                tracing::info!(processed = position + 1, "Batch separator written");
            }
        }
    }

    Ok(report)
}
