//! Audio clip scanner
//!
//! Two-phase scan:
//! - Phase 1: sequential directory traversal (sorted by file name, symlink
//!   loop detection, extension filter)
//! - Phase 2: optional parallel magic-byte verification
//!
//! Results are always returned in file-name order so repeated runs over the
//! same directory classify clips in the same encounter order.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Audio file scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Cannot access file
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

/// Scan result with statistics
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Audio file paths found, in file-name order
    pub files: Vec<PathBuf>,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Count of files by extension (lowercase)
    pub by_format: BTreeMap<String, usize>,
    /// Non-fatal errors encountered
    pub errors: Vec<String>,
}

/// Audio clip scanner
#[derive(Debug, Clone)]
pub struct FileScanner {
    ignore_patterns: Vec<String>,
    extensions: Vec<String>,
    max_depth: Option<usize>,
    verify_magic: bool,
}

impl FileScanner {
    /// Scanner accepting the given extensions (case-insensitive, no dot)
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git. Defaults to the
    /// top level of the directory only.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_depth: Some(1),
            verify_magic: false,
        }
    }

    /// Limit traversal depth (`None` = unlimited, `Some(1)` = top level)
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Also require a known audio signature in the first bytes of each file
    pub fn with_magic_verification(mut self, verify: bool) -> Self {
        self.verify_magic = verify;
        self
    }

    /// Scan directory for clips with an accepted extension
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        // Phase 1: sequential traversal, symlink_visited is mutable state
        let mut candidate_files = Vec::new();
        let mut symlink_visited = HashSet::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .max_depth(self.max_depth.unwrap_or(usize::MAX))
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.has_accepted_extension(entry.path()) {
                        candidate_files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!(
            "Phase 1 complete: {} candidate files discovered",
            candidate_files.len()
        );

        if !self.verify_magic {
            return Ok(candidate_files);
        }

        // Phase 2: parallel magic byte verification (collect keeps order)
        let audio_files: Vec<PathBuf> = candidate_files
            .par_iter()
            .filter_map(|path| match verify_magic_bytes(path) {
                Ok(true) => Some(path.clone()),
                Ok(false) => {
                    tracing::warn!("Skipping {}: not a recognized audio file", path.display());
                    None
                }
                Err(e) => {
                    tracing::warn!("Error verifying {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Phase 2 complete: {} audio files verified from {} candidates",
            audio_files.len(),
            candidate_files.len()
        );

        Ok(audio_files)
    }

    /// Scan with statistics
    pub fn scan_with_stats(&self, root_path: &Path) -> Result<ScanResult, ScanError> {
        let files = self.scan(root_path)?;

        let mut result = ScanResult::default();
        for file in &files {
            match std::fs::metadata(file) {
                Ok(metadata) => result.total_size += metadata.len(),
                Err(e) => result.errors.push(format!("{}: {}", file.display(), e)),
            }

            if let Some(ext) = file.extension() {
                let ext_str = ext.to_string_lossy().to_ascii_lowercase();
                *result.by_format.entry(ext_str).or_insert(0) += 1;
            }
        }
        result.files = files;

        Ok(result)
    }

    fn should_process_entry(&self, entry: &DirEntry, symlink_visited: &mut HashSet<PathBuf>) -> bool {
        // The root itself is always traversed
        if entry.depth() == 0 {
            return true;
        }

        let file_name = entry.file_name().to_string_lossy();
        if self.ignore_patterns.iter().any(|p| file_name.contains(p.as_str())) {
            return false;
        }

        if entry.file_type().is_symlink() {
            if let Ok(canonical) = entry.path().canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", entry.path().display());
                    return false;
                }
            }
        }

        true
    }

    fn has_accepted_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                self.extensions.iter().any(|accepted| *accepted == ext)
            })
            .unwrap_or(false)
    }
}

/// Sniff the container signature; anything `infer` does not call audio is dropped
fn verify_magic_bytes(path: &Path) -> Result<bool, ScanError> {
    let kind = infer::get_from_path(path)
        .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;

    Ok(matches!(kind, Some(k) if k.matcher_type() == infer::MatcherType::Audio))
}
