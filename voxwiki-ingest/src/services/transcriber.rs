//! Speech recognition seam
//!
//! Recognition runs in an external program. [`CommandTranscriber`] invokes it
//! once per clip and takes its standard output as the recognized text.

use crate::error::{IngestError, IngestResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Placeholder replaced by the clip path in recognizer arguments
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Speech-to-text collaborator
pub trait Transcriber: Send + Sync {
    /// Recognized text for one clip (may be empty for silence)
    fn transcribe(&self, path: &Path) -> IngestResult<String>;
}

/// Runs `program args...` with `{input}` substituted
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTranscriber {
    /// Arguments without a `{input}` placeholder get the path appended
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Resolve a bare program name through PATH
    pub fn locate(program: &str, args: Vec<String>) -> IngestResult<Self> {
        let resolved = which::which(program).map_err(|e| {
            IngestError::Config(format!("recognizer '{}' not found: {}", program, e))
        })?;
        Ok(Self::new(resolved, args))
    }

    fn command_args(&self, path: &Path) -> Vec<String> {
        let input = path.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(INPUT_PLACEHOLDER, &input))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(INPUT_PLACEHOLDER)) {
            args.push(input.into_owned());
        }
        args
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, path: &Path) -> IngestResult<String> {
        let args = self.command_args(path);
        tracing::debug!(program = %self.program.display(), ?args, "Running recognizer");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| IngestError::RecognitionFailure {
                path: path.to_path_buf(),
                message: format!("failed to start {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            return Err(IngestError::RecognitionFailure {
                path: path.to_path_buf(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
