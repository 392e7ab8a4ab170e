//! Bilingual merge workflow
//!
//! Plans and renders one merged track per entity: every clip decoded, gain
//! applied, conformed to the mix format and followed by its gap of silence.
//! A clip that fails to decode is skipped but its gap is still inserted, so
//! the timing of later slots stays aligned. An entity with nothing rendered
//! yields `EmptyResult` and no file.

use crate::audio::buffer::{adjust_gain, concat, conform, silence};
use crate::audio::{AudioBuffer, AudioTransform};
use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::services::{FilenameParser, MergePlan, MergePlanner};
use crate::workflow::classify_directory;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Rendered track plus per-clip outcomes
#[derive(Debug, Clone)]
pub struct RenderedTrack {
    pub buffer: AudioBuffer,
    pub rendered: usize,
    /// Source files that failed to decode
    pub failed: Vec<PathBuf>,
}

/// Render a plan into one buffer in the mix format
///
/// # Errors
/// `EmptyResult` when no clip could be rendered.
pub fn render_plan(
    transform: &dyn AudioTransform,
    plan: &MergePlan,
    sample_rate: u32,
    channels: u16,
) -> IngestResult<RenderedTrack> {
    let mut parts = Vec::with_capacity(plan.len() * 2);
    let mut rendered = 0;
    let mut failed = Vec::new();

    for entry in &plan.entries {
        let path = &entry.record.source_path;
        let clip = transform
            .decode(path)
            .and_then(|decoded| conform(&adjust_gain(&decoded, entry.gain_db), sample_rate, channels));

        match clip {
            Ok(clip) => {
                tracing::debug!(
                    file = %entry.record.file_name(),
                    gain_db = entry.gain_db,
                    gap_ms = entry.gap_after_ms,
                    duration_ms = clip.duration_ms(),
                    "Added clip"
                );
                parts.push(clip);
                rendered += 1;
            }
            Err(source) => {
                let err = IngestError::TransformFailure {
                    path: path.clone(),
                    source,
                };
                tracing::warn!(entity = %plan.entity, "Skipping clip, keeping its gap: {}", err);
                failed.push(path.clone());
            }
        }

        parts.push(silence(entry.gap_after_ms, sample_rate, channels));
    }

    if rendered == 0 {
        return Err(IngestError::EmptyResult(plan.entity.clone()));
    }

    let buffer = concat(&parts, sample_rate, channels).map_err(|source| {
        IngestError::TransformFailure {
            path: PathBuf::from(&plan.entity),
            source,
        }
    })?;

    Ok(RenderedTrack {
        buffer,
        rendered,
        failed,
    })
}

/// Per-entity merge outcome
#[derive(Debug, Clone, Serialize, Default)]
pub struct EntityMerge {
    pub entity: String,
    pub planned: usize,
    pub primary: usize,
    pub secondary: usize,
    pub rendered: usize,
    pub failed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub duration_ms: u64,
    /// Why nothing was written for this entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Merge run summary
#[derive(Debug, Clone, Serialize, Default)]
pub struct MergeReport {
    pub scanned: usize,
    pub unrecognized: Vec<String>,
    pub entities: Vec<EntityMerge>,
}

impl MergeReport {
    pub fn written(&self) -> usize {
        self.entities.iter().filter(|e| e.output.is_some()).count()
    }
}

/// Runs the bilingual merge workflow
pub struct BilingualMerger {
    config: IngestConfig,
    transform: Arc<dyn AudioTransform>,
}

impl BilingualMerger {
    pub fn new(config: IngestConfig, transform: Arc<dyn AudioTransform>) -> Self {
        Self { config, transform }
    }

    /// Merge every entity (or just `entity`) into `<output>/<entity>-merged.<ext>`
    ///
    /// # Errors
    /// `MissingDirectory` for a missing input; `EmptyResult` when `entity` is
    /// given and has no recognized clips. Per-entity empty results are
    /// reported, not returned.
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        entity: Option<&str>,
    ) -> IngestResult<MergeReport> {
        let parser = FilenameParser::new(&self.config.vocabulary)?;
        let classification = classify_directory(input, &self.config.scan, &parser)?;

        let groups: Vec<_> = match entity {
            Some(name) => vec![classification
                .index
                .entity(name)
                .cloned()
                .ok_or_else(|| IngestError::EmptyResult(name.to_string()))?],
            None => classification.index.entities().to_vec(),
        };

        let planner = MergePlanner::new(self.config.merge.timing());
        let mut report = MergeReport {
            scanned: classification.scanned,
            unrecognized: classification.unrecognized.clone(),
            entities: Vec::with_capacity(groups.len()),
        };

        tokio::fs::create_dir_all(output).await?;

        for group in &groups {
            let plan = planner.plan(group);
            tracing::debug!(
                entity = %plan.entity,
                entries = plan.len(),
                gap_ms = plan.total_gap_ms(),
                "Merge planned"
            );
            let mut summary = EntityMerge {
                entity: plan.entity.clone(),
                planned: plan.len(),
                primary: plan.count(crate::models::LanguageVariant::Primary),
                secondary: plan.count(crate::models::LanguageVariant::Secondary),
                ..EntityMerge::default()
            };

            match self.merge_entity(plan, output).await {
                Ok((path, track)) => {
                    tracing::info!(
                        entity = %summary.entity,
                        output = %path.display(),
                        rendered = track.rendered,
                        failed = track.failed.len(),
                        duration_ms = track.buffer.duration_ms(),
                        "Merged track written"
                    );
                    summary.rendered = track.rendered;
                    summary.duration_ms = track.buffer.duration_ms();
                    summary.failed = track
                        .failed
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect();
                    summary.output = Some(path);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(entity = %summary.entity, "Nothing written: {}", e);
                    summary.error = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }

            report.entities.push(summary);
        }

        Ok(report)
    }

    async fn merge_entity(
        &self,
        plan: MergePlan,
        output: &Path,
    ) -> IngestResult<(PathBuf, RenderedTrack)> {
        if plan.is_empty() {
            return Err(IngestError::EmptyResult(plan.entity));
        }

        let transform = Arc::clone(&self.transform);
        let options = self.config.output.encode_options();
        let sample_rate = self.config.merge.sample_rate;
        let channels = self.config.merge.channels;
        let path = output.join(format!(
            "{}-merged.{}",
            plan.entity,
            options.format.extension()
        ));

        let (track, bytes) = tokio::task::spawn_blocking(move || -> IngestResult<_> {
            let track = render_plan(transform.as_ref(), &plan, sample_rate, channels)?;
            let bytes = transform.encode(&track.buffer, &options).map_err(|source| {
                IngestError::TransformFailure {
                    path: PathBuf::from(format!("{}-merged", plan.entity)),
                    source,
                }
            })?;
            Ok((track, bytes))
        })
        .await??;

        tokio::fs::write(&path, bytes).await?;
        Ok((path, track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, AudioResult, EncodeOptions};
    use crate::models::Vocabulary;
    use crate::services::GroupingIndex;

    /// 100 ms of constant 0.5 at 1 kHz mono; decode fails for "missing" paths
    struct ToneTransform;

    impl AudioTransform for ToneTransform {
        fn decode(&self, path: &Path) -> AudioResult<AudioBuffer> {
            if path.to_string_lossy().contains("missing") {
                return Err(AudioError::Decode("no such clip".to_string()));
            }
            Ok(AudioBuffer::new(vec![0.5; 100], 1000, 1))
        }

        fn encode(&self, buffer: &AudioBuffer, _options: &EncodeOptions) -> AudioResult<Vec<u8>> {
            Ok(vec![0u8; buffer.samples.len()])
        }
    }

    fn plan(names: &[&str]) -> MergePlan {
        let parser = FilenameParser::new(&Vocabulary::default()).unwrap();
        let index: GroupingIndex = names
            .iter()
            .enumerate()
            .map(|(i, name)| parser.classify(Path::new(name), i).unwrap())
            .collect();
        MergePlanner::default().plan(&index.entities()[0])
    }

    #[test]
    fn test_render_applies_gain_and_gaps() {
        let plan = plan(&["pam_lead_vo_01.ogg", "pam_cn_lead_vo_01.ogg"]);
        let track = render_plan(&ToneTransform, &plan, 1000, 1).unwrap();

        // 100 + 400 + 100 + 600 frames at 1 kHz
        assert_eq!(track.buffer.frames(), 1200);
        assert_eq!(track.rendered, 2);
        assert!((track.buffer.samples[0] - 0.5).abs() < 1e-6);
        assert!((track.buffer.samples[500] - 0.5 * 10f32.powf(3.0 / 20.0)).abs() < 1e-4);
        assert_eq!(track.buffer.samples[150], 0.0);
    }

    #[test]
    fn test_failed_clip_keeps_its_gap() {
        let mut plan = plan(&["pam_lead_vo_01.ogg", "pam_lead_vo_02.ogg"]);
        plan.entries[0].record.source_path = PathBuf::from("/clips/missing.ogg");

        let track = render_plan(&ToneTransform, &plan, 1000, 1).unwrap();
        // 400 (gap only) + 100 + 400
        assert_eq!(track.buffer.frames(), 900);
        assert_eq!(track.rendered, 1);
        assert_eq!(track.failed, vec![PathBuf::from("/clips/missing.ogg")]);
        assert_eq!(track.buffer.samples[399], 0.0);
        assert!((track.buffer.samples[400] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nothing_rendered_is_empty_result() {
        let mut plan = plan(&["pam_die_vo_01.ogg"]);
        plan.entries[0].record.source_path = PathBuf::from("missing.ogg");

        match render_plan(&ToneTransform, &plan, 1000, 1) {
            Err(IngestError::EmptyResult(entity)) => assert_eq!(entity, "pam"),
            other => panic!("Expected EmptyResult, got {:?}", other.map(|t| t.rendered)),
        }
    }

    #[tokio::test]
    async fn test_run_writes_one_file_per_entity() {
        let input = tempfile::TempDir::new().unwrap();
        for name in ["pam_lead_vo_01.ogg", "pam_cn_lead_vo_01.ogg", "bo_die_vo_01.ogg"] {
            std::fs::write(input.path().join(name), b"").unwrap();
        }
        let output = input.path().join("merged");

        let mut config = IngestConfig::default();
        config.merge.sample_rate = 1000;
        config.merge.channels = 1;
        let merger = BilingualMerger::new(config, Arc::new(ToneTransform));

        let report = merger.run(input.path(), &output, None).await.unwrap();
        assert_eq!(report.written(), 2);
        assert!(output.join("pam-merged.mp3").exists());
        assert!(output.join("bo-merged.mp3").exists());

        let pam = report.entities.iter().find(|e| e.entity == "pam").unwrap();
        assert_eq!(pam.primary, 1);
        assert_eq!(pam.secondary, 1);
        assert_eq!(pam.duration_ms, 1200);
    }

    #[tokio::test]
    async fn test_unknown_entity_filter_is_empty_result() {
        let input = tempfile::TempDir::new().unwrap();
        std::fs::write(input.path().join("pam_lead_vo_01.ogg"), b"").unwrap();

        let merger = BilingualMerger::new(IngestConfig::default(), Arc::new(ToneTransform));
        let result = merger
            .run(input.path(), &input.path().join("out"), Some("nobody"))
            .await;
        assert!(matches!(result, Err(IngestError::EmptyResult(_))));
    }
}
