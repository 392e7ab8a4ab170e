//! Prefix conversion workflow
//!
//! Re-encodes every file with a configured extension to
//! `<output>/<prefix><stem>.<ext>`, e.g. `12.wav` → `Richman10_vo_12.mp3`.

use crate::audio::AudioTransform;
use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::services::{FileScanner, ScanError};
use crate::workflow::conversion::{convert_all, ConversionJob};
use crate::workflow::wiki_export::FailedClip;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix conversion summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConvertReport {
    pub scanned: usize,
    pub converted: Vec<PathBuf>,
    pub failed: Vec<FailedClip>,
}

/// Runs the prefix conversion workflow
pub struct PrefixConverter {
    config: IngestConfig,
    transform: Arc<dyn AudioTransform>,
}

impl PrefixConverter {
    pub fn new(config: IngestConfig, transform: Arc<dyn AudioTransform>) -> Self {
        Self { config, transform }
    }

    /// Destination name for one source file
    pub fn output_name(prefix: &str, source: &Path, extension: &str) -> String {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}{}.{}", prefix, stem, extension)
    }

    /// Convert every matching top-level file of `input` into `output`
    pub async fn run(&self, input: &Path, output: &Path) -> IngestResult<ConvertReport> {
        let files = FileScanner::new(&self.config.conversion.extensions)
            .scan(input)
            .map_err(|e| match e {
                ScanError::PathNotFound(path) | ScanError::NotADirectory(path) => {
                    IngestError::MissingDirectory(path)
                }
                other => IngestError::Scan(other),
            })?;

        tokio::fs::create_dir_all(output).await?;

        let options = self.config.output.encode_options();
        let prefix = &self.config.conversion.prefix;
        let jobs: Vec<ConversionJob> = files
            .iter()
            .enumerate()
            .map(|(key, source)| ConversionJob {
                key,
                source: source.clone(),
                destination: output.join(Self::output_name(
                    prefix,
                    source,
                    options.format.extension(),
                )),
            })
            .collect();

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            files = jobs.len(),
            prefix = %prefix,
            "Converting files"
        );

        let outcomes = convert_all(
            Arc::clone(&self.transform),
            jobs,
            &options,
            self.config.conversion.max_parallel,
        )
        .await;

        let mut report = ConvertReport {
            scanned: files.len(),
            ..ConvertReport::default()
        };
        for outcome in outcomes {
            match outcome.result {
                Ok(()) => report.converted.push(outcome.job.destination),
                Err(e) => report.failed.push(FailedClip {
                    file: outcome.job.source.display().to_string(),
                    error: e.to_string(),
                }),
            }
        }

        Ok(report)
    }
}
