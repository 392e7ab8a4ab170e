//! Deterministic section ordering
//!
//! **Ordering rules:**
//! - voice categories by display order, empty ones omitted
//! - "other effects" last, ordered by (effect token, index)
//! - within a category: index, then Primary before Secondary, then scan order

use crate::models::{CategoryId, ClipRecord};
use crate::services::grouping_index::EntityGroup;
use std::collections::HashSet;

/// One transcript section
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: CategoryId,
    pub label: String,
    pub records: Vec<ClipRecord>,
}

/// Order an entity's categories and records for emission
pub fn sequence(group: &EntityGroup) -> Vec<Section> {
    group
        .categories()
        .filter(|(_, records)| !records.is_empty())
        .map(|(id, records)| {
            let mut records = records.to_vec();
            match id {
                CategoryId::Voice { .. } => {
                    records.sort_by_key(|r| (r.index, r.language, r.encounter));
                }
                CategoryId::OtherEffects => {
                    records.sort_by(|a, b| {
                        a.category
                            .token
                            .cmp(&b.category.token)
                            .then(a.index.cmp(&b.index))
                            .then(a.language.cmp(&b.language))
                            .then(a.encounter.cmp(&b.encounter))
                    });
                }
            }

            Section {
                id: id.clone(),
                label: records[0].category.label.clone(),
                records,
            }
        })
        .collect()
}

/// Drop records whose scan position is in `excluded`, then empty sections
pub fn without_encounters(sections: Vec<Section>, excluded: &HashSet<usize>) -> Vec<Section> {
    if excluded.is_empty() {
        return sections;
    }

    sections
        .into_iter()
        .filter_map(|mut section| {
            section.records.retain(|r| !excluded.contains(&r.encounter));
            (!section.records.is_empty()).then_some(section)
        })
        .collect()
}
