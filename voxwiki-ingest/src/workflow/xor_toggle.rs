//! Byte-group XOR toggle
//!
//! XORs the first byte of every `group_size`-byte group with `key`. The
//! transform is its own inverse: applying it twice restores the input
//! bit-for-bit. Nothing else is promised about it.

use crate::config::XorConfig;
use crate::error::{IngestError, IngestResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix appended to the file name when not overwriting
pub const DECRYPTED_SUFFIX: &str = "_decrypted";

/// XOR toggle summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct XorReport {
    pub processed: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Toggle `data` in place
pub fn toggle_bytes(data: &mut [u8], key: u8, group_size: usize) {
    for byte in data.iter_mut().step_by(group_size.max(1)) {
        *byte ^= key;
    }
}

/// Where the toggled copy of `path` goes
pub fn output_path(path: &Path, overwrite: bool) -> PathBuf {
    if overwrite {
        return path.to_path_buf();
    }
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(DECRYPTED_SUFFIX);
    path.with_file_name(name)
}

fn toggle_file(source: &Path, destination: &Path, config: &XorConfig) -> std::io::Result<()> {
    let mut data = std::fs::read(source)?;
    toggle_bytes(&mut data, config.key, config.group_size);
    std::fs::write(destination, data)
}

/// Toggle every regular file under `input`, recursively
///
/// The file list is collected before anything is written, so `_decrypted`
/// copies created by this run are not processed again.
///
/// # Errors
/// `MissingDirectory` when `input` is not a directory. Per-file failures are
/// logged and reported.
pub fn xor_directory(input: &Path, config: &XorConfig) -> IngestResult<XorReport> {
    if !input.is_dir() {
        return Err(IngestError::MissingDirectory(input.to_path_buf()));
    }
    if config.group_size == 0 {
        return Err(IngestError::Config("xor.group_size must be at least 1".to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => tracing::warn!("Error accessing entry: {}", e),
        }
    }

    let mut report = XorReport::default();
    for source in files {
        let destination = output_path(&source, config.overwrite);
        match toggle_file(&source, &destination, config) {
            Ok(()) => {
                tracing::info!(
                    source = %source.display(),
                    destination = %destination.display(),
                    "Toggled file"
                );
                report.processed.push(destination);
            }
            Err(e) => {
                tracing::warn!(source = %source.display(), "XOR failed: {}", e);
                report.failed.push(format!("{}: {}", source.display(), e));
            }
        }
    }

    Ok(report)
}
