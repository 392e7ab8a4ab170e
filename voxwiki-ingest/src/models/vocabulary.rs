//! Vocabulary tables and category normalization
//!
//! The condition and effect vocabularies are plain data: adding a trigger or
//! an effect type is a config change (`[vocabulary]` in the TOML file), never
//! a code change. [`Vocabulary::normalize_condition`] and
//! [`Vocabulary::normalize_effect`] are pure mappings, so the same token always
//! yields the same [`Category`].

use crate::models::category::{Category, CategoryId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One voice-line trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// Singular lowercase token as it appears in filenames
    pub token: String,
    /// Display rank
    pub order: u32,
    /// Localized header label
    pub label: String,
}

/// One known sound-effect type
///
/// Entries without `script`/`translation` are still recognized by the
/// filename parser but get synthesized labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectEntry {
    /// Lowercase token, may contain `_` (e.g. `atk_sfx`)
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// Declarative lookup tables driving classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub conditions: Vec<ConditionEntry>,
    pub effects: Vec<EffectEntry>,
    /// Header label of the "other effects" super-category
    pub other_effects_label: String,
    /// Appended to synthesized effect scripts to form the translation
    pub effect_suffix: String,
    /// Token marking the secondary language, placed right after the entity name
    pub language_marker: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let condition = |token: &str, order: u32, label: &str| ConditionEntry {
            token: token.to_string(),
            order,
            label: label.to_string(),
        };
        let effect = |token: &str, labels: Option<(&str, &str)>| EffectEntry {
            token: token.to_string(),
            script: labels.map(|(s, _)| s.to_string()),
            translation: labels.map(|(_, t)| t.to_string()),
        };

        Self {
            conditions: vec![
                condition("start", 1, "登场时"),
                condition("lead", 2, "局势领先时"),
                condition("hurt", 3, "遭受攻击时"),
                condition("kill", 4, "击杀敌人时"),
                condition("die", 5, "死亡时"),
                condition("ulti", 6, "使用超级技能时"),
            ],
            effects: vec![
                effect("atk_sfx", Some(("Atk SFX", "普攻音效"))),
                effect("atk_hit", Some(("Atk Hit", "普攻命中"))),
                effect("atk_flyback_sfx", None),
                effect("reload_sfx", Some(("Reload SFX", "填弹音效"))),
                effect("dryfire_sfx", Some(("Dryfire SFX", "子弹用尽"))),
                effect("ulti_sfx", Some(("Ulti SFX", "大招音效"))),
            ],
            other_effects_label: "其他音效".to_string(),
            effect_suffix: "音效".to_string(),
            language_marker: "cn".to_string(),
        }
    }
}

impl Vocabulary {
    /// Check the tables are usable for parsing
    ///
    /// Tokens must be non-empty lowercase ASCII (`a-z`, `0-9`, `_`) without
    /// leading/trailing separators, and neither tokens nor display ranks may
    /// repeat.
    pub fn validate(&self) -> Result<(), String> {
        fn check_token(kind: &str, token: &str) -> Result<(), String> {
            let valid_chars = token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if token.is_empty() || !valid_chars || token.starts_with('_') || token.ends_with('_')
            {
                return Err(format!("invalid {} token '{}'", kind, token));
            }
            Ok(())
        }

        if self.conditions.is_empty() {
            return Err("condition vocabulary is empty".to_string());
        }

        let mut tokens = HashSet::new();
        let mut orders = HashSet::new();
        for entry in &self.conditions {
            check_token("condition", &entry.token)?;
            if entry.token.contains('_') {
                return Err(format!("condition token '{}' must not contain '_'", entry.token));
            }
            if !tokens.insert(entry.token.as_str()) {
                return Err(format!("duplicate condition token '{}'", entry.token));
            }
            if !orders.insert(entry.order) {
                return Err(format!("duplicate display order {}", entry.order));
            }
        }

        let mut effect_tokens = HashSet::new();
        for entry in &self.effects {
            check_token("effect", &entry.token)?;
            if !effect_tokens.insert(entry.token.as_str()) {
                return Err(format!("duplicate effect token '{}'", entry.token));
            }
        }

        check_token("language marker", &self.language_marker)?;
        Ok(())
    }

    /// Every surface form of every condition (singular and plural)
    pub fn condition_surface_forms(&self) -> Vec<String> {
        self.conditions
            .iter()
            .flat_map(|c| [c.token.clone(), format!("{}s", c.token)])
            .collect()
    }

    /// Known effect types, longest first so the most specific suffix wins
    pub fn known_effect_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.effects.iter().map(|e| e.token.clone()).collect();
        types.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        types
    }

    fn condition(&self, token: &str) -> Option<&ConditionEntry> {
        self.conditions.iter().find(|c| c.token == token)
    }

    /// Map a raw condition token onto its canonical voice category
    ///
    /// A trailing plural `s` is stripped only when the singular form is in the
    /// vocabulary (`kills` → `kill`). Returns `None` for tokens outside the
    /// vocabulary.
    pub fn normalize_condition(&self, raw: &str) -> Option<Category> {
        let lowered = raw.to_ascii_lowercase();
        let canonical = match lowered.strip_suffix('s') {
            Some(singular) if self.condition(singular).is_some() => singular,
            _ => lowered.as_str(),
        };

        let entry = self.condition(canonical)?;
        Some(Category {
            id: CategoryId::Voice {
                token: entry.token.clone(),
                order: entry.order,
            },
            token: entry.token.clone(),
            label: entry.label.clone(),
            script: String::new(),
            translation: String::new(),
        })
    }

    /// Map a raw effect type onto the "other effects" super-category
    ///
    /// Table entries provide script and translation; anything else gets a
    /// title-cased script (`weird_type` → `Weird Type`) and a translation of
    /// script plus the effect suffix.
    pub fn normalize_effect(&self, raw: &str) -> Category {
        let token = raw.to_ascii_lowercase();
        let entry = self.effects.iter().find(|e| e.token == token);

        let script = entry
            .and_then(|e| e.script.clone())
            .unwrap_or_else(|| title_case(&token.replace('_', " ")));
        let translation = entry
            .and_then(|e| e.translation.clone())
            .unwrap_or_else(|| format!("{}{}", script, self.effect_suffix));

        Category {
            id: CategoryId::OtherEffects,
            token,
            label: self.other_effects_label.clone(),
            script,
            translation,
        }
    }
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest
///
/// `"weird type"` → `"Weird Type"`, `"2x boom"` → `"2X Boom"`.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_alphabetic = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_alphabetic {
                result.extend(ch.to_lowercase());
            } else {
                result.extend(ch.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            result.push(ch);
            previous_alphabetic = false;
        }
    }

    result
}
