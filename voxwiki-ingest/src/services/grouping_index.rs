//! Per-entity accumulator of classified clips
//!
//! The index is passed explicitly through the pipeline: classification feeds
//! it, sequencing and merge planning read from it. Entities keep first-seen
//! order; categories are keyed by [`CategoryId`], whose ordering is the
//! display order.

use crate::models::{CategoryId, ClipRecord};
use std::collections::{BTreeMap, HashMap};

/// All clips sharing one entity name
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup {
    name: String,
    categories: BTreeMap<CategoryId, Vec<ClipRecord>>,
}

impl EntityGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Categories in display order, records in insertion order
    pub fn categories(&self) -> impl Iterator<Item = (&CategoryId, &[ClipRecord])> {
        self.categories.iter().map(|(id, records)| (id, records.as_slice()))
    }

    /// Every record, category by category
    pub fn clips(&self) -> impl Iterator<Item = &ClipRecord> {
        self.categories.values().flatten()
    }

    pub fn clip_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    fn push(&mut self, record: ClipRecord) {
        self.categories
            .entry(record.category.id.clone())
            .or_default()
            .push(record);
    }
}

/// Accumulator keyed by entity, then category
#[derive(Debug, Clone, Default)]
pub struct GroupingIndex {
    groups: Vec<EntityGroup>,
    positions: HashMap<String, usize>,
}

impl GroupingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record; duplicates are kept
    pub fn insert(&mut self, record: ClipRecord) {
        let position = match self.positions.get(&record.entity_name) {
            Some(&position) => position,
            None => {
                let position = self.groups.len();
                self.groups.push(EntityGroup::new(record.entity_name.clone()));
                self.positions.insert(record.entity_name.clone(), position);
                position
            }
        };
        self.groups[position].push(record);
    }

    /// Entity groups in first-seen order
    pub fn entities(&self) -> &[EntityGroup] {
        &self.groups
    }

    pub fn entity(&self, name: &str) -> Option<&EntityGroup> {
        self.positions.get(name).map(|&position| &self.groups[position])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clip_count(&self) -> usize {
        self.groups.iter().map(EntityGroup::clip_count).sum()
    }
}

impl FromIterator<ClipRecord> for GroupingIndex {
    fn from_iter<I: IntoIterator<Item = ClipRecord>>(iter: I) -> Self {
        let mut index = GroupingIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::filename_parser::FilenameParser;
    use crate::models::Vocabulary;
    use std::path::Path;

    fn records(names: &[&str]) -> Vec<ClipRecord> {
        let parser = FilenameParser::new(&Vocabulary::default()).unwrap();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| parser.classify(Path::new(name), i).unwrap())
            .collect()
    }

    #[test]
    fn test_entities_in_first_seen_order() {
        let index: GroupingIndex = records(&[
            "zed_start_vo_01.ogg",
            "amy_start_vo_01.ogg",
            "zed_kill_vo_01.ogg",
        ])
        .into_iter()
        .collect();

        let names: Vec<&str> = index.entities().iter().map(EntityGroup::name).collect();
        assert_eq!(names, vec!["zed", "amy"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.clip_count(), 3);
        assert_eq!(index.entity("zed").unwrap().clip_count(), 2);
        assert!(index.entity("nobody").is_none());
    }

    #[test]
    fn test_secondary_language_joins_primary_entity() {
        let index: GroupingIndex = records(&["pam_lead_vo_01.ogg", "pam_cn_lead_vo_01.ogg"])
            .into_iter()
            .collect();

        assert_eq!(index.len(), 1);
        let group = index.entity("pam").unwrap();
        assert_eq!(group.categories().count(), 1);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let index: GroupingIndex = records(&["kaya_start_vo_01.ogg", "kaya_starts_vo_01.ogg"])
            .into_iter()
            .collect();
        assert_eq!(index.clip_count(), 2);
    }

    #[test]
    fn test_categories_in_display_order() {
        let index: GroupingIndex = records(&[
            "kaya_atk_sfx_01.ogg",
            "kaya_die_vo_01.ogg",
            "kaya_start_vo_01.ogg",
        ])
        .into_iter()
        .collect();

        let orders: Vec<u32> = index.entities()[0]
            .categories()
            .map(|(id, _)| id.display_order())
            .collect();
        assert_eq!(orders, vec![1, 5, crate::models::OTHER_EFFECTS_ORDER]);
    }
}
