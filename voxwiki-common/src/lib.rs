//! # voxwiki common library
//!
//! Shared code for the voxwiki tools:
//! - Error and Result types
//! - TOML configuration loading, path resolution and atomic write-back
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
