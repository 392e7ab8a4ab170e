//! Wiki markup transcript rendering
//!
//! One section per category:
//!
//! ```text
//! ==登场时==
//! {{BSAudio|File=BS_kaya_start_vo_01.mp3|Script=|Translation=}}
//!
//! ==其他音效==
//! {{BSAudio|File=BS_kaya_atk_sfx_01.mp3|Script=Atk SFX|Translation=普攻音效}}
//!
//! ```
//!
//! The `File=` value is the name the converted clip is written under, so the
//! same [`OutputNaming`] is used for conversion and for emission.

use crate::models::{ClipRecord, LanguageVariant};
use crate::services::sequencer::Section;
use std::fmt::Write;

/// Derived output file names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    /// Fixed prefix (`BS`); empty means no prefix
    pub prefix: String,
    /// Output extension without the dot
    pub extension: String,
    /// Inserted after the entity for Secondary clips
    pub language_marker: String,
}

impl OutputNaming {
    /// `<prefix>_<entity>[_<marker>]_<token>_<NN>.<ext>`
    pub fn file_name(&self, record: &ClipRecord) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if !self.prefix.is_empty() {
            parts.push(&self.prefix);
        }
        parts.push(&record.entity_name);
        if record.language == LanguageVariant::Secondary {
            parts.push(&self.language_marker);
        }
        let token = record.category.output_token();
        parts.push(&token);
        let index = record.padded_index();
        parts.push(&index);

        format!("{}.{}", parts.join("_"), self.extension)
    }
}

/// Renders sequenced sections as wiki markup
#[derive(Debug, Clone)]
pub struct TranscriptEmitter {
    naming: OutputNaming,
    template: String,
}

impl TranscriptEmitter {
    pub fn new(naming: OutputNaming, template: impl Into<String>) -> Self {
        Self {
            naming,
            template: template.into(),
        }
    }

    /// Render one entity's transcript
    pub fn render(&self, sections: &[Section]) -> String {
        let mut out = String::new();
        for section in sections {
            // Writing to a String cannot fail
            let _ = writeln!(out, "=={}==", section.label);
            for record in &section.records {
                let _ = writeln!(out, "{}", self.line(record));
            }
            out.push('\n');
        }
        out
    }

    /// One `{{Template|File=..|Script=..|Translation=..}}` line
    pub fn line(&self, record: &ClipRecord) -> String {
        let (script, translation) = if record.category.is_voice_line() {
            ("", "")
        } else {
            (
                record.category.script.as_str(),
                record.category.translation.as_str(),
            )
        };

        format!(
            "{{{{{}|File={}|Script={}|Translation={}}}}}",
            self.template,
            self.naming.file_name(record),
            script,
            translation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vocabulary;
    use crate::services::filename_parser::FilenameParser;
    use crate::services::grouping_index::GroupingIndex;
    use crate::services::sequencer::sequence;
    use std::path::Path;

    fn naming() -> OutputNaming {
        OutputNaming {
            prefix: "BS".to_string(),
            extension: "mp3".to_string(),
            language_marker: "cn".to_string(),
        }
    }

    fn sections(names: &[&str]) -> Vec<Section> {
        let parser = FilenameParser::new(&Vocabulary::default()).unwrap();
        let index: GroupingIndex = names
            .iter()
            .enumerate()
            .map(|(i, name)| parser.classify(Path::new(name), i).unwrap())
            .collect();
        sequence(&index.entities()[0])
    }

    #[test]
    fn test_file_names() {
        let parser = FilenameParser::new(&Vocabulary::default()).unwrap();
        let voice = parser.classify(Path::new("kaya_starts_vo_2.ogg"), 0).unwrap();
        let secondary = parser.classify(Path::new("pam_cn_lead_vo_01.ogg"), 1).unwrap();
        let effect = parser.classify(Path::new("bull_atk_sfx_123.ogg"), 2).unwrap();

        assert_eq!(naming().file_name(&voice), "BS_kaya_start_vo_02.mp3");
        assert_eq!(naming().file_name(&secondary), "BS_pam_cn_lead_vo_01.mp3");
        assert_eq!(naming().file_name(&effect), "BS_bull_atk_sfx_123.mp3");

        let bare = OutputNaming {
            prefix: String::new(),
            ..naming()
        };
        assert_eq!(bare.file_name(&voice), "kaya_start_vo_02.mp3");
    }

    #[test]
    fn test_render_kaya_transcript() {
        let emitter = TranscriptEmitter::new(naming(), "BSAudio");
        let text = emitter.render(&sections(&[
            "kaya_start_vo_01.ogg",
            "kaya_starts_vo_02.ogg",
            "kaya_atk_sfx_01.ogg",
        ]));

        let expected = "==登场时==\n\
            {{BSAudio|File=BS_kaya_start_vo_01.mp3|Script=|Translation=}}\n\
            {{BSAudio|File=BS_kaya_start_vo_02.mp3|Script=|Translation=}}\n\
            \n\
            ==其他音效==\n\
            {{BSAudio|File=BS_kaya_atk_sfx_01.mp3|Script=Atk SFX|Translation=普攻音效}}\n\
            \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_unknown_effect_line() {
        let emitter = TranscriptEmitter::new(naming(), "BSAudio");
        let text = emitter.render(&sections(&["boss_weirdtype_07.ogg"]));
        assert!(text.contains(
            "{{BSAudio|File=BS_boss_weirdtype_07.mp3|Script=Weirdtype|Translation=Weirdtype音效}}"
        ));
    }

    #[test]
    fn test_empty_sections_render_nothing() {
        let emitter = TranscriptEmitter::new(naming(), "BSAudio");
        assert_eq!(emitter.render(&[]), "");
    }
}
