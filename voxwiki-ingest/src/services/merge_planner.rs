//! Bilingual merge planning
//!
//! Builds the playback plan for one entity's merged track.
//!
//! **Algorithm:**
//! 1. Blocks in display order: each voice trigger, then one block per effect
//!    type in token order
//! 2. Within a block, split by language and sort each side by index
//! 3. For slot `i` in `0..max(primary, secondary)`: the Primary clip at `i`
//!    (gain 0, primary gap), then the Secondary clip at `i` (secondary gain,
//!    secondary gap)
//!
//! Slots pair clips by position, not by index equality. A slot holding only
//! one side uses `unpaired_gap_ms` when configured.

use crate::models::{CategoryId, ClipRecord, LanguageVariant};
use crate::services::grouping_index::EntityGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gap pairing preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeProfile {
    /// Primary and Secondary are different languages (400 ms / 600 ms)
    #[default]
    Mixed,
    /// Both tracks in one language (500 ms / 500 ms)
    SameLanguage,
}

impl std::str::FromStr for MergeProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "mixed" => Ok(MergeProfile::Mixed),
            "same-language" | "same" => Ok(MergeProfile::SameLanguage),
            other => Err(format!(
                "unknown merge profile '{}' (expected mixed or same-language)",
                other
            )),
        }
    }
}

/// Default Secondary boost in dB
pub const DEFAULT_SECONDARY_GAIN_DB: f32 = 3.0;

/// Gap and gain settings for one merge run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeTiming {
    pub primary_gap_ms: u32,
    pub secondary_gap_ms: u32,
    /// Overrides both gaps for single-sided slots
    pub unpaired_gap_ms: Option<u32>,
    pub secondary_gain_db: f32,
}

impl MergeTiming {
    pub fn for_profile(profile: MergeProfile) -> Self {
        let (primary_gap_ms, secondary_gap_ms) = match profile {
            MergeProfile::Mixed => (400, 600),
            MergeProfile::SameLanguage => (500, 500),
        };
        Self {
            primary_gap_ms,
            secondary_gap_ms,
            unpaired_gap_ms: None,
            secondary_gain_db: DEFAULT_SECONDARY_GAIN_DB,
        }
    }
}

impl Default for MergeTiming {
    fn default() -> Self {
        Self::for_profile(MergeProfile::default())
    }
}

/// One clip in the merged track
#[derive(Debug, Clone, PartialEq)]
pub struct MergeEntry {
    pub record: ClipRecord,
    /// Silence appended after the clip
    pub gap_after_ms: u32,
    pub gain_db: f32,
}

/// Ordered playback plan for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub entity: String,
    pub entries: Vec<MergeEntry>,
}

impl MergePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, language: LanguageVariant) -> usize {
        self.entries
            .iter()
            .filter(|e| e.record.language == language)
            .count()
    }

    /// Sum of all gaps, excluding clip audio
    pub fn total_gap_ms(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.gap_after_ms)).sum()
    }
}

/// Merge planner
#[derive(Debug, Clone, Default)]
pub struct MergePlanner {
    timing: MergeTiming,
}

impl MergePlanner {
    pub fn new(timing: MergeTiming) -> Self {
        Self { timing }
    }

    /// Plan the merged track for one entity
    pub fn plan(&self, group: &EntityGroup) -> MergePlan {
        let mut entries = Vec::with_capacity(group.clip_count());

        for (id, records) in group.categories() {
            match id {
                CategoryId::Voice { .. } => self.interleave(records.iter(), &mut entries),
                CategoryId::OtherEffects => {
                    let mut by_type: BTreeMap<&str, Vec<&ClipRecord>> = BTreeMap::new();
                    for record in records {
                        by_type
                            .entry(record.category.token.as_str())
                            .or_default()
                            .push(record);
                    }
                    for block in by_type.into_values() {
                        self.interleave(block.into_iter(), &mut entries);
                    }
                }
            }
        }

        tracing::debug!(
            entity = group.name(),
            entries = entries.len(),
            "Merge plan built"
        );

        MergePlan {
            entity: group.name().to_string(),
            entries,
        }
    }

    fn interleave<'a>(
        &self,
        block: impl Iterator<Item = &'a ClipRecord>,
        entries: &mut Vec<MergeEntry>,
    ) {
        let (mut primary, mut secondary): (Vec<&ClipRecord>, Vec<&ClipRecord>) =
            block.partition(|r| r.language == LanguageVariant::Primary);
        primary.sort_by_key(|r| (r.index, r.encounter));
        secondary.sort_by_key(|r| (r.index, r.encounter));

        for slot in 0..primary.len().max(secondary.len()) {
            let paired = slot < primary.len() && slot < secondary.len();
            let gap = |side_gap: u32| match self.timing.unpaired_gap_ms {
                Some(unpaired) if !paired => unpaired,
                _ => side_gap,
            };

            if let Some(record) = primary.get(slot) {
                entries.push(MergeEntry {
                    record: (*record).clone(),
                    gap_after_ms: gap(self.timing.primary_gap_ms),
                    gain_db: 0.0,
                });
            }
            if let Some(record) = secondary.get(slot) {
                entries.push(MergeEntry {
                    record: (*record).clone(),
                    gap_after_ms: gap(self.timing.secondary_gap_ms),
                    gain_db: self.timing.secondary_gain_db,
                });
            }
        }
    }
}
