//! Filename classification
//!
//! Every piece of clip metadata lives in the filename. Two patterns are tried
//! in fixed priority order:
//!
//! 1. Voice line: `<name>_<condition>_vo_<number>.<ext>`
//! 2. Other effect: `<name>_<type>_<number>.<ext>`
//!
//! For effects the known-type rule wins over the fallback: the longest known
//! effect type that ends the stem (before the number) is taken first, so
//! `bull_atk_sfx_01` is entity `bull`, type `atk_sfx`. Only when no known type
//! matches is the single token before the number used as the type.

use crate::error::{IngestError, IngestResult};
use crate::models::{ClipRecord, LanguageVariant, Vocabulary};
use regex::Regex;
use std::path::Path;

/// Which vocabulary a parsed token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Condition,
    EffectType,
}

/// Raw parse of one filename, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    /// Everything before the category token, language marker included
    pub entity_name: String,
    /// Category token exactly as written
    pub token: String,
    pub kind: TokenKind,
    pub index: u32,
    pub extension: String,
}

/// Filename parser built from a [`Vocabulary`]
#[derive(Debug, Clone)]
pub struct FilenameParser {
    vocabulary: Vocabulary,
    voice_pattern: Regex,
    effect_types: Vec<String>,
}

impl FilenameParser {
    /// Compile the voice-line pattern for the vocabulary's condition forms
    pub fn new(vocabulary: &Vocabulary) -> IngestResult<Self> {
        vocabulary.validate().map_err(IngestError::Config)?;

        let mut forms = vocabulary.condition_surface_forms();
        forms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = forms
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");

        let voice_pattern = Regex::new(&format!(
            r"(?i)^(?P<name>.+?)_(?P<condition>{})_vo_(?P<number>[0-9]+)\.(?P<ext>[A-Za-z0-9]+)$",
            alternation
        ))
        .map_err(|e| IngestError::Config(format!("voice pattern: {}", e)))?;

        Ok(Self {
            vocabulary: vocabulary.clone(),
            voice_pattern,
            effect_types: vocabulary.known_effect_types(),
        })
    }

    /// Parse a bare file name; `None` when neither pattern matches
    pub fn parse(&self, filename: &str) -> Option<ParsedFilename> {
        self.parse_voice(filename)
            .or_else(|| self.parse_effect(filename))
    }

    fn parse_voice(&self, filename: &str) -> Option<ParsedFilename> {
        let caps = self.voice_pattern.captures(filename)?;
        // An index that overflows u32 is not a clip number we can order by
        let index = caps["number"].parse::<u32>().ok()?;

        Some(ParsedFilename {
            entity_name: caps["name"].to_string(),
            token: caps["condition"].to_string(),
            kind: TokenKind::Condition,
            index,
            extension: caps["ext"].to_string(),
        })
    }

    fn parse_effect(&self, filename: &str) -> Option<ParsedFilename> {
        let (stem, extension) = filename.rsplit_once('.')?;
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let (head, number) = stem.rsplit_once('_')?;
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let index = number.parse::<u32>().ok()?;

        let (entity_name, token) = match self.split_known_type(head) {
            Some(split) => split,
            None => {
                let split = head.rsplit_once('_')?;
                if split.1.eq_ignore_ascii_case("vo") {
                    // Unknown condition: the condition word stays in the entity name
                    tracing::debug!(
                        file = filename,
                        entity = split.0,
                        "Voice-line name with an unknown condition, parsed as effect type 'vo'"
                    );
                }
                split
            }
        };
        if entity_name.is_empty() || token.is_empty() {
            return None;
        }

        Some(ParsedFilename {
            entity_name: entity_name.to_string(),
            token: token.to_string(),
            kind: TokenKind::EffectType,
            index,
            extension: extension.to_string(),
        })
    }

    /// Split `head` as `<name>_<known type>`, longest known type first
    fn split_known_type<'a>(&self, head: &'a str) -> Option<(&'a str, &'a str)> {
        self.effect_types.iter().find_map(|known| {
            // Need at least one name character plus the separator
            if head.len() <= known.len() + 1 {
                return None;
            }
            let type_start = head.len() - known.len();
            if !head.is_char_boundary(type_start) {
                return None;
            }
            let (name_part, token) = head.split_at(type_start);
            let name = name_part.strip_suffix('_')?;
            (token.eq_ignore_ascii_case(known) && !name.is_empty()).then_some((name, token))
        })
    }

    /// Split the language marker off a raw entity name
    ///
    /// `pam_cn` → (`pam`, Secondary); `pam` → (`pam`, Primary). The marker
    /// alone is an entity name, not a marker.
    pub fn split_language<'a>(&self, raw_entity: &'a str) -> (&'a str, LanguageVariant) {
        let marker = &self.vocabulary.language_marker;
        if raw_entity.len() > marker.len() + 1 {
            let marker_start = raw_entity.len() - marker.len();
            if raw_entity.is_char_boundary(marker_start) {
                let (name_part, suffix) = raw_entity.split_at(marker_start);
                if let Some(name) = name_part.strip_suffix('_') {
                    if suffix.eq_ignore_ascii_case(marker) && !name.is_empty() {
                        return (name, LanguageVariant::Secondary);
                    }
                }
            }
        }
        (raw_entity, LanguageVariant::Primary)
    }

    /// Parse, split language and normalize one clip path
    ///
    /// # Errors
    /// `UnrecognizedFilename` when the name matches neither pattern.
    pub fn classify(&self, path: &Path, encounter: usize) -> IngestResult<ClipRecord> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let parsed = self
            .parse(&file_name)
            .ok_or_else(|| IngestError::UnrecognizedFilename(file_name.clone()))?;

        let (entity_name, language) = self.split_language(&parsed.entity_name);

        let category = match parsed.kind {
            TokenKind::Condition => self
                .vocabulary
                .normalize_condition(&parsed.token)
                .ok_or_else(|| IngestError::UnrecognizedFilename(file_name.clone()))?,
            TokenKind::EffectType => self.vocabulary.normalize_effect(&parsed.token),
        };

        Ok(ClipRecord {
            entity_name: entity_name.to_string(),
            category,
            index: parsed.index,
            language,
            source_path: path.to_path_buf(),
            encounter,
        })
    }
}
