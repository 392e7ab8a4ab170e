//! End-to-end workflow tests with generated WAV fixtures

mod helpers;

use helpers::audio_generator::wav_duration_ms;
use helpers::{generate_clip_set, generate_test_wav, wav_config, write_garbage, ClipConfig};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use voxwiki_ingest::audio::SymphoniaTransform;
use voxwiki_ingest::config::{TranscribeConfig, XorConfig};
use voxwiki_ingest::services::Transcriber;
use voxwiki_ingest::workflow::{
    transcribe_directory, xor_directory, BilingualMerger, PrefixConverter, WikiExporter,
};
use voxwiki_ingest::{IngestError, IngestResult};

fn wav_transform() -> Arc<SymphoniaTransform> {
    Arc::new(SymphoniaTransform::default())
}

#[tokio::test]
async fn test_wiki_export_converts_and_writes_transcript() {
    let input = TempDir::new().unwrap();
    generate_clip_set(
        input.path(),
        &[
            "kaya_start_vo_01.wav",
            "kaya_starts_vo_02.wav",
            "kaya_atk_sfx_01.wav",
            "readme.wav",
        ],
        &ClipConfig::default(),
    )
    .unwrap();
    let output = input.path().join("output");

    let exporter = WikiExporter::new(wav_config(), wav_transform());
    let report = exporter.run(input.path(), &output, false).await.unwrap();

    assert_eq!(report.scanned, 4);
    assert_eq!(report.recognized, 3);
    assert_eq!(report.unrecognized, vec!["readme.wav"]);
    assert_eq!(report.converted, 3);
    assert!(report.failed.is_empty());

    let text = std::fs::read_to_string(output.join("kaya.txt")).unwrap();
    assert_eq!(
        text,
        "==登场时==\n\
         {{BSAudio|File=BS_kaya_start_vo_01.wav|Script=|Translation=}}\n\
         {{BSAudio|File=BS_kaya_start_vo_02.wav|Script=|Translation=}}\n\
         \n\
         ==其他音效==\n\
         {{BSAudio|File=BS_kaya_atk_sfx_01.wav|Script=Atk SFX|Translation=普攻音效}}\n\
         \n"
    );

    for name in [
        "BS_kaya_start_vo_01.wav",
        "BS_kaya_start_vo_02.wav",
        "BS_kaya_atk_sfx_01.wav",
    ] {
        let converted = output.join("audio").join(name);
        assert_eq!(wav_duration_ms(&converted).unwrap(), 200, "{}", name);
    }
}

#[tokio::test]
async fn test_wiki_export_is_byte_identical_on_rerun() {
    let input = TempDir::new().unwrap();
    generate_clip_set(
        input.path(),
        &[
            "rico_ulti_vo_01.wav",
            "rico_cn_ulti_vo_01.wav",
            "rico_hurt_vo_03.wav",
            "rico_hurt_vo_01.wav",
            "rico_boom_02.wav",
            "bea_lead_vo_01.wav",
        ],
        &ClipConfig::default(),
    )
    .unwrap();

    let first_out = TempDir::new().unwrap();
    let second_out = TempDir::new().unwrap();
    let mut config = wav_config();
    config.conversion.max_parallel = 3;

    let exporter = WikiExporter::new(config, wav_transform());
    exporter.run(input.path(), first_out.path(), false).await.unwrap();
    exporter.run(input.path(), second_out.path(), false).await.unwrap();

    for entity in ["rico", "bea"] {
        let file = format!("{}.txt", entity);
        let first = std::fs::read(first_out.path().join(&file)).unwrap();
        let second = std::fs::read(second_out.path().join(&file)).unwrap();
        assert_eq!(first, second, "{}", file);
    }
}

#[tokio::test]
async fn test_transcript_only_skips_conversion() {
    let input = TempDir::new().unwrap();
    // Undecodable clips still appear when nothing is converted
    write_garbage(input.path(), "kaya_die_vo_01.wav");
    write_garbage(input.path(), "kaya_dies_vo_02.wav");
    let output = input.path().join("out");

    let exporter = WikiExporter::new(wav_config(), wav_transform());
    let report = exporter.run(input.path(), &output, true).await.unwrap();

    assert_eq!(report.converted, 0);
    assert!(report.failed.is_empty());
    assert!(!output.join("audio").exists());

    let text = std::fs::read_to_string(output.join("kaya.txt")).unwrap();
    assert!(text.starts_with("==死亡时==\n"));
    assert_eq!(text.matches("{{BSAudio").count(), 2);
}

#[tokio::test]
async fn test_wiki_export_drops_undecodable_clip() {
    let input = TempDir::new().unwrap();
    generate_clip_set(input.path(), &["kaya_start_vo_01.wav"], &ClipConfig::default()).unwrap();
    write_garbage(input.path(), "kaya_start_vo_02.wav");
    let output = input.path().join("out");

    let exporter = WikiExporter::new(wav_config(), wav_transform());
    let report = exporter.run(input.path(), &output, false).await.unwrap();

    assert_eq!(report.converted, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file, "kaya_start_vo_02.wav");

    let text = std::fs::read_to_string(output.join("kaya.txt")).unwrap();
    assert!(text.contains("BS_kaya_start_vo_01.wav"));
    assert!(!text.contains("BS_kaya_start_vo_02.wav"));
}

#[tokio::test]
async fn test_missing_input_directory_is_fatal() {
    let output = TempDir::new().unwrap();
    let exporter = WikiExporter::new(wav_config(), wav_transform());

    let result = exporter
        .run(Path::new("/nonexistent/voxwiki/clips"), output.path(), false)
        .await;
    assert!(matches!(result, Err(IngestError::MissingDirectory(_))));
    // Nothing was written
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_merge_renders_interleaved_track() {
    let input = TempDir::new().unwrap();
    let clip = ClipConfig {
        sample_rate: 22050,
        channels: 1,
        ..ClipConfig::default()
    };
    generate_clip_set(
        input.path(),
        &["pam_lead_vo_01.wav", "pam_lead_vo_02.wav", "pam_cn_lead_vo_01.wav"],
        &clip,
    )
    .unwrap();
    let output = input.path().join("merged");

    let merger = BilingualMerger::new(wav_config(), wav_transform());
    let report = merger.run(input.path(), &output, Some("pam")).await.unwrap();

    let pam = &report.entities[0];
    assert_eq!(pam.planned, 3);
    assert_eq!(pam.rendered, 3);

    // 3 clips of 200 ms plus 400 + 600 + 400 ms of gaps
    let merged = output.join("pam-merged.wav");
    let duration = wav_duration_ms(&merged).unwrap();
    assert!(
        (1960..=2040).contains(&duration),
        "merged duration {} ms",
        duration
    );

    let reader = hound::WavReader::open(&merged).unwrap();
    assert_eq!(reader.spec().sample_rate, 44100);
    assert_eq!(reader.spec().channels, 2);
}

#[tokio::test]
async fn test_merge_keeps_gap_of_failed_clip() {
    let input = TempDir::new().unwrap();
    generate_clip_set(
        input.path(),
        &["pam_lead_vo_01.wav", "pam_lead_vo_02.wav"],
        &ClipConfig::default(),
    )
    .unwrap();
    write_garbage(input.path(), "pam_cn_lead_vo_01.wav");
    let output = input.path().join("merged");

    let merger = BilingualMerger::new(wav_config(), wav_transform());
    let report = merger.run(input.path(), &output, None).await.unwrap();

    let pam = &report.entities[0];
    assert_eq!(pam.rendered, 2);
    assert_eq!(pam.failed.len(), 1);
    // 200 + 400, (failed) 600, 200 + 400
    assert_eq!(wav_duration_ms(&output.join("pam-merged.wav")).unwrap(), 1800);
}

#[tokio::test]
async fn test_merge_with_nothing_decodable_writes_nothing() {
    let input = TempDir::new().unwrap();
    write_garbage(input.path(), "pam_die_vo_01.wav");
    write_garbage(input.path(), "pam_cn_die_vo_01.wav");
    let output = input.path().join("merged");

    let merger = BilingualMerger::new(wav_config(), wav_transform());
    let report = merger.run(input.path(), &output, None).await.unwrap();

    assert_eq!(report.written(), 0);
    assert!(report.entities[0].error.as_deref().unwrap().contains("pam"));
    assert!(!output.join("pam-merged.wav").exists());
}

#[tokio::test]
async fn test_merge_same_language_profile() {
    let input = TempDir::new().unwrap();
    generate_clip_set(
        input.path(),
        &["bo_kill_vo_01.wav", "bo_cn_kill_vo_01.wav"],
        &ClipConfig::default(),
    )
    .unwrap();
    let output = input.path().join("merged");

    let mut config = wav_config();
    config.merge.profile = voxwiki_ingest::services::MergeProfile::SameLanguage;
    let merger = BilingualMerger::new(config, wav_transform());
    merger.run(input.path(), &output, None).await.unwrap();

    // 200 + 500 + 200 + 500
    assert_eq!(wav_duration_ms(&output.join("bo-merged.wav")).unwrap(), 1400);
}

#[tokio::test]
async fn test_prefix_convert() {
    let input = TempDir::new().unwrap();
    generate_clip_set(input.path(), &["1.wav", "2.WAV"], &ClipConfig::default()).unwrap();
    std::fs::write(input.path().join("notes.txt"), b"skip me").unwrap();
    let output = input.path().join("converted");

    let mut config = wav_config();
    config.conversion.prefix = "Richman10_vo_".to_string();
    let report = PrefixConverter::new(config, wav_transform())
        .run(input.path(), &output)
        .await
        .unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.converted.len(), 2);
    assert!(output.join("Richman10_vo_1.wav").exists());
    assert!(output.join("Richman10_vo_2.wav").exists());
}

#[test]
fn test_xor_twice_restores_directory() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("nested/deeper")).unwrap();
    let files = [
        ("a.bin", (0..=255u8).collect::<Vec<u8>>()),
        ("nested/b.bin", vec![7u8; 13]),
        ("nested/deeper/c.bin", Vec::new()),
    ];
    for (name, data) in &files {
        std::fs::write(root.path().join(name), data).unwrap();
    }

    let config = XorConfig::default();
    let report = xor_directory(root.path(), &config).unwrap();
    assert_eq!(report.processed.len(), 3);
    assert_ne!(std::fs::read(root.path().join("a.bin")).unwrap(), files[0].1);

    xor_directory(root.path(), &config).unwrap();
    for (name, data) in &files {
        assert_eq!(&std::fs::read(root.path().join(name)).unwrap(), data, "{}", name);
    }
}

#[test]
fn test_xor_without_overwrite_keeps_original() {
    let root = TempDir::new().unwrap();
    let original = b"\x00\x01\x02\x03\x04".to_vec();
    std::fs::write(root.path().join("asset"), &original).unwrap();

    let config = XorConfig {
        overwrite: false,
        ..XorConfig::default()
    };
    xor_directory(root.path(), &config).unwrap();

    assert_eq!(std::fs::read(root.path().join("asset")).unwrap(), original);
    assert_eq!(
        std::fs::read(root.path().join("asset_decrypted")).unwrap(),
        b"\x01\x01\x02\x03\x05".to_vec()
    );
}

/// Text is "clip <stem>"; stem 3 is silent, stem 4 fails
struct FakeTranscriber;

impl Transcriber for FakeTranscriber {
    fn transcribe(&self, path: &Path) -> IngestResult<String> {
        let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
        match stem.as_str() {
            "3" => Ok("   ".to_string()),
            "4" => Err(IngestError::RecognitionFailure {
                path: path.to_path_buf(),
                message: "model crashed".to_string(),
            }),
            _ => Ok(format!("clip {}", stem)),
        }
    }
}

#[test]
fn test_transcription_numeric_order_and_separators() {
    let input = TempDir::new().unwrap();
    for stem in ["10", "1", "2", "3", "4", "5"] {
        generate_test_wav(
            &input.path().join(format!("{}.wav", stem)),
            &ClipConfig {
                duration_ms: 10,
                ..ClipConfig::default()
            },
        )
        .unwrap();
    }
    let output = input.path().join("text").join("all.txt");

    let config = TranscribeConfig {
        batch_size: Some(2),
        ..TranscribeConfig::default()
    };
    let report = transcribe_directory(input.path(), &output, &FakeTranscriber, &config).unwrap();

    assert_eq!(report.processed, 6);
    assert_eq!(report.lines, 4);
    assert_eq!(report.empty, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.separators, 3);

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        text,
        "clip 1\nclip 2\n==============\n==============\nclip 5\nclip 10\n==============\n"
    );
}

#[test]
fn test_transcription_missing_directory() {
    let output = TempDir::new().unwrap();
    let result = transcribe_directory(
        Path::new("/nonexistent/voxwiki/audio"),
        &output.path().join("out.txt"),
        &FakeTranscriber,
        &TranscribeConfig::default(),
    );
    assert!(matches!(result, Err(IngestError::MissingDirectory(_))));
}
