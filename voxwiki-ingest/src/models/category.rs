//! Canonical clip categories
//!
//! Every clip belongs to exactly one [`Category`]. Voice-line triggers carry a
//! fixed display rank; all sound effects share the single "other effects"
//! super-category, which always sorts after the voice triggers.

use std::cmp::Ordering;

/// Display rank given to the "other effects" super-category
pub const OTHER_EFFECTS_ORDER: u32 = u32::MAX;

/// Grouping key for a category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryId {
    /// Triggered voice line (start, lead, hurt, kill, die, ulti)
    Voice {
        /// Canonical singular condition token
        token: String,
        /// Fixed display rank (1..6 with the default vocabulary)
        order: u32,
    },
    /// Every sound effect, known or synthesized
    OtherEffects,
}

impl CategoryId {
    /// Rank used for global sequencing
    pub fn display_order(&self) -> u32 {
        match self {
            CategoryId::Voice { order, .. } => *order,
            CategoryId::OtherEffects => OTHER_EFFECTS_ORDER,
        }
    }

    /// Voice lines render with blank script/translation fields
    pub fn is_voice_line(&self) -> bool {
        matches!(self, CategoryId::Voice { .. })
    }
}

impl Ord for CategoryId {
    fn cmp(&self, other: &Self) -> Ordering {
        let token = |id: &CategoryId| match id {
            CategoryId::Voice { token, .. } => token.clone(),
            CategoryId::OtherEffects => String::new(),
        };

        self.display_order()
            .cmp(&other.display_order())
            .then_with(|| token(self).cmp(&token(other)))
    }
}

impl PartialOrd for CategoryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Normalized category of one clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Grouping key
    pub id: CategoryId,
    /// Canonical token (singular condition, or lowercase effect type)
    pub token: String,
    /// Localized section header label
    pub label: String,
    /// Script field (empty for voice lines)
    pub script: String,
    /// Translation field (empty for voice lines)
    pub translation: String,
}

impl Category {
    pub fn display_order(&self) -> u32 {
        self.id.display_order()
    }

    pub fn is_voice_line(&self) -> bool {
        self.id.is_voice_line()
    }

    /// Token used in derived output file names
    ///
    /// Voice lines keep their `_vo` marker (`start_vo`); effects use the effect
    /// type as-is (`atk_sfx`).
    pub fn output_token(&self) -> String {
        if self.is_voice_line() {
            format!("{}_vo", self.token)
        } else {
            self.token.clone()
        }
    }
}
