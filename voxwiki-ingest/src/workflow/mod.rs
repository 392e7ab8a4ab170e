//! End-to-end workflows behind the `voxwiki` subcommands
//!
//! - [`wiki_export`]: scan → classify → group → convert → sequence → emit
//! - [`bilingual_merge`]: scan → classify → group → plan → render one track
//! - [`prefix_convert`]: batch re-encode with a name prefix
//! - [`xor_toggle`]: reversible byte-group XOR over a directory tree
//! - [`transcription`]: external recognizer over a directory, one text file
//!
//! The two classification workflows share [`classify_directory`].

pub mod bilingual_merge;
pub mod conversion;
pub mod prefix_convert;
pub mod transcription;
pub mod wiki_export;
pub mod xor_toggle;

pub use bilingual_merge::{BilingualMerger, MergeReport};
pub use prefix_convert::{ConvertReport, PrefixConverter};
pub use transcription::{transcribe_directory, TranscriptionReport};
pub use wiki_export::{WikiExportReport, WikiExporter};
pub use xor_toggle::{xor_directory, XorReport};

use crate::config::ScanConfig;
use crate::error::{IngestError, IngestResult};
use crate::services::{FileScanner, FilenameParser, GroupingIndex, ScanError};
use std::path::Path;

/// Classified contents of one input directory
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub index: GroupingIndex,
    /// File names matching neither pattern, in scan order
    pub unrecognized: Vec<String>,
    /// Files with an accepted extension
    pub scanned: usize,
}

/// Scan `input` and classify every clip into a [`GroupingIndex`]
///
/// # Errors
/// `MissingDirectory` when `input` is absent or not a directory; nothing is
/// processed in that case. Unrecognized names are collected, not returned as
/// errors.
pub fn classify_directory(
    input: &Path,
    scan: &ScanConfig,
    parser: &FilenameParser,
) -> IngestResult<Classification> {
    let scanner = FileScanner::new(&scan.extensions)
        .with_max_depth(scan.depth_limit())
        .with_magic_verification(scan.verify_magic);

    let stats = scanner.scan_with_stats(input).map_err(|e| match e {
        ScanError::PathNotFound(path) | ScanError::NotADirectory(path) => {
            IngestError::MissingDirectory(path)
        }
        other => IngestError::Scan(other),
    })?;
    for error in &stats.errors {
        tracing::warn!("Scan: {}", error);
    }
    tracing::debug!(
        files = stats.files.len(),
        total_bytes = stats.total_size,
        by_format = ?stats.by_format,
        "Scan complete"
    );
    let files = stats.files;

    let mut classification = Classification {
        scanned: files.len(),
        ..Classification::default()
    };

    for (encounter, path) in files.iter().enumerate() {
        match parser.classify(path, encounter) {
            Ok(record) => {
                tracing::debug!(
                    file = %record.file_name(),
                    entity = %record.entity_name,
                    category = %record.category.token,
                    index = record.index,
                    language = ?record.language,
                    "Classified clip"
                );
                classification.index.insert(record);
            }
            Err(IngestError::UnrecognizedFilename(name)) => {
                tracing::warn!(file = %name, "Unrecognized filename, skipping");
                classification.unrecognized.push(name);
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        input = %input.display(),
        scanned = classification.scanned,
        recognized = classification.index.clip_count(),
        unrecognized = classification.unrecognized.len(),
        entities = classification.index.len(),
        "Classification complete"
    );

    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vocabulary;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify_directory_collects_unrecognized() {
        let dir = TempDir::new().unwrap();
        for name in ["kaya_start_vo_01.ogg", "mystery.ogg", "kaya_atk_sfx_01.ogg"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let parser = FilenameParser::new(&Vocabulary::default()).unwrap();
        let result = classify_directory(dir.path(), &ScanConfig::default(), &parser).unwrap();

        assert_eq!(result.scanned, 3);
        assert_eq!(result.index.clip_count(), 2);
        assert_eq!(result.unrecognized, vec!["mystery.ogg"]);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let parser = FilenameParser::new(&Vocabulary::default()).unwrap();
        let result = classify_directory(
            Path::new("/nonexistent/voxwiki/input"),
            &ScanConfig::default(),
            &parser,
        );
        assert!(matches!(result, Err(IngestError::MissingDirectory(_))));
    }
}
