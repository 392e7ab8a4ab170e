//! Bounded clip conversion pool
//!
//! Each clip's decode/encode is independent, so conversions run as blocking
//! tasks gated by a semaphore. Outcomes are collected in job order after every
//! task has joined, so nothing downstream depends on completion order.

use crate::audio::{convert_file, AudioTransform, EncodeOptions};
use crate::error::{IngestError, IngestResult};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// One source → destination conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Caller-defined key (scan position for clip conversions)
    pub key: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Result of one job
#[derive(Debug)]
pub struct ConversionOutcome {
    pub job: ConversionJob,
    pub result: IngestResult<()>,
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run all jobs with at most `max_parallel` conversions in flight
///
/// Failures are logged and returned per job; the pool itself never aborts.
pub async fn convert_all(
    transform: Arc<dyn AudioTransform>,
    jobs: Vec<ConversionJob>,
    options: &EncodeOptions,
    max_parallel: usize,
) -> Vec<ConversionOutcome> {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let start = std::time::Instant::now();
    let total = jobs.len();

    let mut handles = Vec::with_capacity(total);
    for job in &jobs {
        let semaphore = Arc::clone(&semaphore);
        let transform = Arc::clone(&transform);
        let options = options.clone();
        let source = job.source.clone();
        let destination = job.destination.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| IngestError::Task(format!("conversion permit: {}", e)))?;

            let path = source.clone();
            tokio::task::spawn_blocking(move || {
                convert_file(transform.as_ref(), &source, &destination, &options)
            })
            .await?
            .map_err(|source| IngestError::TransformFailure { path, source })
        }));
    }

    let mut outcomes = Vec::with_capacity(total);
    for (job, handle) in jobs.into_iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(IngestError::from(e)),
        };

        match &result {
            Ok(()) => tracing::info!(
                source = %job.source.display(),
                destination = %job.destination.display(),
                "Converted clip"
            ),
            Err(e) => tracing::warn!(source = %job.source.display(), "Skipping clip: {}", e),
        }

        outcomes.push(ConversionOutcome { job, result });
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    tracing::info!(
        total,
        succeeded,
        failed = total - succeeded,
        elapsed_ms = start.elapsed().as_millis() as u64,
        max_parallel,
        "Conversion pool finished"
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioBuffer, AudioError, AudioResult};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every path containing "bad", records peak concurrency
    #[derive(Default)]
    struct CountingTransform {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl AudioTransform for CountingTransform {
        fn decode(&self, path: &Path) -> AudioResult<AudioBuffer> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);

            if path.to_string_lossy().contains("bad") {
                return Err(AudioError::Decode("corrupt".to_string()));
            }
            Ok(AudioBuffer::new(vec![0.0; 4], 8000, 1))
        }

        fn encode(&self, _buffer: &AudioBuffer, _options: &EncodeOptions) -> AudioResult<Vec<u8>> {
            Ok(b"encoded".to_vec())
        }
    }

    fn jobs(dir: &Path, names: &[&str]) -> Vec<ConversionJob> {
        names
            .iter()
            .enumerate()
            .map(|(key, name)| ConversionJob {
                key,
                source: dir.join(name),
                destination: dir.join(format!("{}.out", name)),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_outcomes_keep_job_order_and_isolate_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let transform = Arc::new(CountingTransform::default());

        let outcomes = convert_all(
            transform.clone(),
            jobs(dir.path(), &["a", "bad", "c", "d"]),
            &EncodeOptions::default(),
            2,
        )
        .await;

        let keys: Vec<usize> = outcomes.iter().map(|o| o.job.key).collect();
        assert_eq!(keys, vec![0, 1, 2, 3]);
        assert!(outcomes[0].is_success());
        assert!(matches!(
            outcomes[1].result,
            Err(IngestError::TransformFailure { .. })
        ));
        assert!(dir.path().join("c.out").exists());
        assert!(!dir.path().join("bad.out").exists());
        assert!(transform.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_single_permit_is_sequential() {
        let dir = tempfile::TempDir::new().unwrap();
        let transform = Arc::new(CountingTransform::default());

        let outcomes = convert_all(
            transform.clone(),
            jobs(dir.path(), &["a", "b", "c"]),
            &EncodeOptions::default(),
            1,
        )
        .await;

        assert!(outcomes.iter().all(ConversionOutcome::is_success));
        assert_eq!(transform.peak.load(Ordering::SeqCst), 1);
    }
}
