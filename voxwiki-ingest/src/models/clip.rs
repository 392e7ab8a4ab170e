//! Clip records

use crate::models::category::Category;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Language track a clip belongs to
///
/// Ordering puts `Primary` first, which is also the order clips are
/// interleaved in within a merge slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageVariant {
    /// No language marker in the filename
    Primary,
    /// Language marker present (e.g. `pam_cn_start_vo_01.ogg`)
    Secondary,
}

/// One physical audio file after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRecord {
    /// Subject the clip belongs to, language marker stripped
    pub entity_name: String,
    pub category: Category,
    /// Numeric suffix from the filename
    pub index: u32,
    pub language: LanguageVariant,
    /// Original file, never modified
    pub source_path: PathBuf,
    /// Position in the scan, final tie-break for duplicate keys
    pub encounter: usize,
}

impl ClipRecord {
    /// File name of the source, lossy for display
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }

    /// Two-digit zero-padded index (`7` → `07`, `123` → `123`)
    pub fn padded_index(&self) -> String {
        format!("{:02}", self.index)
    }
}
