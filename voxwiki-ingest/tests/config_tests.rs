//! IngestConfig loading through the shared TOML layer
//!
//! Tests touching VOXWIKI_CONFIG are marked #[serial].

use serial_test::serial;
use std::env;
use tempfile::TempDir;
use voxwiki_common::config::CONFIG_ENV_VAR;
use voxwiki_ingest::audio::OutputFormat;
use voxwiki_ingest::services::MergeProfile;
use voxwiki_ingest::{IngestConfig, IngestError};

#[test]
#[serial]
fn test_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("voxwiki.toml");
    std::fs::write(
        &path,
        r#"
[output]
prefix = "WK"
format = "wav"

[merge]
profile = "same-language"
unpaired_gap_ms = 250

[conversion]
max_parallel = 8
"#,
    )
    .unwrap();

    let config = IngestConfig::load(Some(&path)).unwrap();
    assert_eq!(config.output.prefix, "WK");
    assert_eq!(config.output.format, OutputFormat::Wav);
    assert_eq!(config.output.template, "BSAudio");
    assert_eq!(config.merge.profile, MergeProfile::SameLanguage);
    assert_eq!(config.conversion.max_parallel, 8);

    let timing = config.merge.timing();
    assert_eq!(timing.primary_gap_ms, 500);
    assert_eq!(timing.secondary_gap_ms, 500);
    assert_eq!(timing.unpaired_gap_ms, Some(250));
    assert_eq!(config.scan.extensions, vec!["ogg".to_string()]);
}

#[test]
#[serial]
fn test_env_var_selects_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("from_env.toml");
    std::fs::write(&path, "[output]\nprefix = \"ENV\"\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let config = IngestConfig::load(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().output.prefix, "ENV");
}

#[test]
#[serial]
fn test_missing_file_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = IngestConfig::load(Some(&temp_dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config, IngestConfig::default());
}

#[test]
#[serial]
fn test_invalid_values_are_config_errors() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "[conversion]\nmax_parallel = 0\n").unwrap();

    let result = IngestConfig::load(Some(&path));
    assert!(matches!(result, Err(IngestError::Config(_))));
}

#[test]
#[serial]
fn test_malformed_toml_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[output\nprefix = ").unwrap();

    assert!(IngestConfig::load(Some(&path)).is_err());
}

#[test]
#[serial]
fn test_load_or_default_survives_broken_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[merge\nprofile = ").unwrap();

    let config = IngestConfig::load_or_default(Some(&path));
    assert_eq!(config, IngestConfig::default());
}
