//! voxwiki-ingest library interface
//!
//! Turns a directory of filename-tagged voice and sound-effect clips into wiki
//! transcripts, converted clips and bilingual merged tracks. Exposed as a
//! library so integration tests can drive the workflows directly.

pub mod audio;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::config::IngestConfig;
pub use crate::error::{IngestError, IngestResult};
