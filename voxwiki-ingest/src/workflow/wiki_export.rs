//! Wiki export workflow
//!
//! **Phases:**
//! 1. Scan and classify the input directory
//! 2. Convert every clip to `<output>/<audio dir>/<derived name>` on the
//!    bounded pool (skipped in transcript-only mode)
//! 3. Sequence each entity and drop clips whose conversion failed
//! 4. Write `<output>/<entity>.txt`
//!
//! Conversions are joined before phase 3, so transcripts are byte-identical
//! across runs over an unchanged directory.

use crate::audio::AudioTransform;
use crate::config::IngestConfig;
use crate::error::IngestResult;
use crate::models::ClipRecord;
use crate::services::{
    sequence, without_encounters, FilenameParser, GroupingIndex, OutputNaming, TranscriptEmitter,
};
use crate::workflow::classify_directory;
use crate::workflow::conversion::{convert_all, ConversionJob};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Clip that could not be converted
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedClip {
    pub file: String,
    pub error: String,
}

/// Per-entity transcript summary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntityTranscript {
    pub entity: String,
    pub transcript: PathBuf,
    pub sections: usize,
    pub lines: usize,
}

/// Wiki export run summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct WikiExportReport {
    pub scanned: usize,
    pub recognized: usize,
    pub unrecognized: Vec<String>,
    pub converted: usize,
    /// Clips sharing a derived name with an earlier clip
    pub duplicate_names: usize,
    pub failed: Vec<FailedClip>,
    pub entities: Vec<EntityTranscript>,
}

/// Runs the wiki export workflow
pub struct WikiExporter {
    config: IngestConfig,
    transform: Arc<dyn AudioTransform>,
}

impl WikiExporter {
    pub fn new(config: IngestConfig, transform: Arc<dyn AudioTransform>) -> Self {
        Self { config, transform }
    }

    /// Export transcripts (and converted clips unless `transcript_only`)
    ///
    /// # Errors
    /// `MissingDirectory` for a missing input, I/O errors creating the output
    /// tree or writing a transcript. Per-clip failures are reported, not
    /// returned.
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        transcript_only: bool,
    ) -> IngestResult<WikiExportReport> {
        let parser = FilenameParser::new(&self.config.vocabulary)?;
        let classification = classify_directory(input, &self.config.scan, &parser)?;

        let mut report = WikiExportReport {
            scanned: classification.scanned,
            recognized: classification.index.clip_count(),
            unrecognized: classification.unrecognized.clone(),
            ..WikiExportReport::default()
        };

        tokio::fs::create_dir_all(output).await?;

        let naming = OutputNaming {
            prefix: self.config.output.prefix.clone(),
            extension: self.config.output.format.extension().to_string(),
            language_marker: self.config.vocabulary.language_marker.clone(),
        };

        let failed_encounters = if transcript_only {
            tracing::info!("Transcript-only mode, skipping audio conversion");
            HashSet::new()
        } else {
            self.convert_clips(&classification.index, &naming, output, &mut report)
                .await?
        };

        let emitter = TranscriptEmitter::new(naming, self.config.output.template.clone());
        for group in classification.index.entities() {
            let sections = without_encounters(sequence(group), &failed_encounters);
            let text = emitter.render(&sections);

            let transcript = output.join(format!("{}.txt", group.name()));
            tokio::fs::write(&transcript, text.as_bytes()).await?;

            let lines = sections.iter().map(|s| s.records.len()).sum();
            tracing::info!(
                entity = group.name(),
                transcript = %transcript.display(),
                sections = sections.len(),
                lines,
                "Transcript written"
            );

            report.entities.push(EntityTranscript {
                entity: group.name().to_string(),
                transcript,
                sections: sections.len(),
                lines,
            });
        }

        Ok(report)
    }

    /// Convert one clip per derived name; returns the encounters that failed
    ///
    /// Clips sharing a derived name are candidates for the same output file.
    /// The first in scan order is tried first; when it fails the next one is
    /// tried, until one succeeds or all have failed. Candidates never tried
    /// stay in the transcript and point at the converted file.
    async fn convert_clips(
        &self,
        index: &GroupingIndex,
        naming: &OutputNaming,
        output: &Path,
        report: &mut WikiExportReport,
    ) -> IngestResult<HashSet<usize>> {
        let audio_dir = output.join(&self.config.output.audio_dir);
        tokio::fs::create_dir_all(&audio_dir).await?;

        let mut records: Vec<&ClipRecord> =
            index.entities().iter().flat_map(|g| g.clips()).collect();
        records.sort_by_key(|r| r.encounter);

        let mut slots: Vec<(String, Vec<&ClipRecord>)> = Vec::new();
        let mut slot_of: HashMap<String, usize> = HashMap::new();
        for record in records {
            let name = naming.file_name(record);
            match slot_of.get(&name) {
                Some(&slot) => {
                    tracing::debug!(
                        file = %record.file_name(),
                        output = %name,
                        "Derived name shared with an earlier clip"
                    );
                    report.duplicate_names += 1;
                    slots[slot].1.push(record);
                }
                None => {
                    slot_of.insert(name.clone(), slots.len());
                    slots.push((name, vec![record]));
                }
            }
        }

        let options = self.config.output.encode_options();
        let mut failed = HashSet::new();
        // (slot, candidate) pairs for the next pool run
        let mut pending: Vec<(usize, usize)> = (0..slots.len()).map(|slot| (slot, 0)).collect();

        while !pending.is_empty() {
            let jobs = pending
                .iter()
                .map(|&(slot, candidate)| {
                    let (name, clips) = &slots[slot];
                    ConversionJob {
                        key: clips[candidate].encounter,
                        source: clips[candidate].source_path.clone(),
                        destination: audio_dir.join(name),
                    }
                })
                .collect();

            let outcomes = convert_all(
                Arc::clone(&self.transform),
                jobs,
                &options,
                self.config.conversion.max_parallel,
            )
            .await;

            let mut retry = Vec::new();
            for ((slot, candidate), outcome) in pending.into_iter().zip(outcomes) {
                match outcome.result {
                    Ok(()) => report.converted += 1,
                    Err(e) => {
                        failed.insert(outcome.job.key);
                        report.failed.push(FailedClip {
                            file: outcome
                                .job
                                .source
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_default(),
                            error: e.to_string(),
                        });

                        if candidate + 1 < slots[slot].1.len() {
                            tracing::info!(
                                output = %slots[slot].0,
                                next = %slots[slot].1[candidate + 1].file_name(),
                                "Trying the next clip with the same derived name"
                            );
                            retry.push((slot, candidate + 1));
                        }
                    }
                }
            }
            pending = retry;
        }

        Ok(failed)
    }
}
