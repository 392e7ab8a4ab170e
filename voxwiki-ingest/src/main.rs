//! voxwiki - voice clip wiki tooling
//!
//! Subcommands:
//! - `wiki`: transcripts plus converted clips for every entity
//! - `merge`: one bilingual merged track per entity
//! - `convert`: batch re-encode with a file name prefix
//! - `xor`: reversible byte-group XOR over a directory tree
//! - `transcribe`: external speech recognizer over a directory
//! - `config`: write or print the effective configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use voxwiki_common::config::{default_config_path, write_toml_config};
use voxwiki_common::logging::{init_tracing, with_startup_logging};
use voxwiki_ingest::audio::{AudioTransform, OutputFormat, SymphoniaTransform};
use voxwiki_ingest::config::CONFIG_FILE_STEM;
use voxwiki_ingest::services::{CommandTranscriber, MergeProfile};
use voxwiki_ingest::workflow::{
    transcribe_directory, xor_directory, BilingualMerger, PrefixConverter, WikiExporter,
};
use voxwiki_ingest::IngestConfig;

/// Command-line arguments for voxwiki
#[derive(Parser, Debug)]
#[command(name = "voxwiki")]
#[command(about = "Classify, convert, transcribe and merge filename-tagged voice clips")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true, env = "VOXWIKI_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VOXWIKI_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write wiki transcripts and converted clips
    Wiki(WikiArgs),
    /// Merge Primary and Secondary clips into one track per entity
    Merge(MergeArgs),
    /// Convert files to `<prefix><stem>.<ext>`
    Convert(ConvertArgs),
    /// Toggle the XOR mask on every file of a directory tree
    Xor(XorArgs),
    /// Transcribe clips with an external recognizer
    Transcribe(TranscribeArgs),
    /// Configuration file helpers
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
struct WikiArgs {
    /// Directory of clips
    #[arg(short, long, env = "VOXWIKI_INPUT_DIR")]
    input: PathBuf,

    /// Output directory (default: `<input>/output`)
    #[arg(short, long, env = "VOXWIKI_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Only write transcripts, do not convert audio
    #[arg(long)]
    transcript_only: bool,

    /// Output file name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Output format (mp3, wav)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// MP3 bitrate (e.g. 192k)
    #[arg(long)]
    bitrate: Option<String>,

    /// Write a JSON run report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Directory of clips
    #[arg(short, long, env = "VOXWIKI_INPUT_DIR")]
    input: PathBuf,

    /// Output directory (default: `<input>/output`)
    #[arg(short, long, env = "VOXWIKI_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Merge only this entity
    #[arg(short, long)]
    entity: Option<String>,

    /// Gap preset (mixed, same-language)
    #[arg(long)]
    profile: Option<MergeProfile>,

    /// Gap after Primary clips
    #[arg(long)]
    primary_gap_ms: Option<u32>,

    /// Gap after Secondary clips
    #[arg(long)]
    secondary_gap_ms: Option<u32>,

    /// Gap after clips without an other-language companion
    #[arg(long)]
    unpaired_gap_ms: Option<u32>,

    /// Secondary clip gain in dB
    #[arg(long, allow_negative_numbers = true)]
    gain_db: Option<f32>,

    /// Output format (mp3, wav)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Write a JSON run report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Directory of source files
    #[arg(short, long, env = "VOXWIKI_INPUT_DIR")]
    input: PathBuf,

    /// Output directory (default: the input directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prepended to every output file name
    #[arg(long)]
    prefix: Option<String>,

    /// Output format (mp3, wav)
    #[arg(long)]
    format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
struct XorArgs {
    /// Directory tree to toggle
    #[arg(short, long, env = "VOXWIKI_INPUT_DIR")]
    input: PathBuf,

    /// XOR key byte (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_key)]
    key: Option<u8>,

    /// Bytes per group; only the first byte of a group is toggled
    #[arg(long)]
    group_size: Option<usize>,

    /// Write `<name>_decrypted` instead of overwriting
    #[arg(long)]
    no_overwrite: bool,
}

#[derive(Args, Debug)]
struct TranscribeArgs {
    /// Directory of clips
    #[arg(short, long, env = "VOXWIKI_INPUT_DIR")]
    input: PathBuf,

    /// Output text file
    #[arg(short, long)]
    output: PathBuf,

    /// Recognizer executable
    #[arg(long, env = "VOXWIKI_RECOGNIZER")]
    program: Option<String>,

    /// Separator line after every N clips
    #[arg(long)]
    batch_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default configuration file
    Init {
        /// Destination (default: the platform config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as TOML
    Show,
}

fn parse_key(value: &str) -> std::result::Result<u8, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid key '{}': {}", value, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config init --force` must still work when the current file is unusable
    let replacing = matches!(
        cli.command,
        Command::Config(ConfigCommand::Init { force: true, .. })
    );
    let mut config = with_startup_logging(|| {
        if replacing {
            Ok(IngestConfig::load_or_default(cli.config.as_deref()))
        } else {
            IngestConfig::load(cli.config.as_deref())
        }
    })
    .context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting voxwiki (build {} {} {})",
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match cli.command {
        Command::Wiki(args) => run_wiki(config, args).await,
        Command::Merge(args) => run_merge(config, args).await,
        Command::Convert(args) => run_convert(config, args).await,
        Command::Xor(args) => run_xor(config, args).await,
        Command::Transcribe(args) => run_transcribe(config, args).await,
        Command::Config(command) => run_config(config, cli.config.as_deref(), command),
    }
}

/// Audio collaborator, failing early when MP3 output has no encoder
fn audio_transform(format: OutputFormat) -> Result<Arc<dyn AudioTransform>> {
    let transform = SymphoniaTransform::new();
    if !transform.supports(format) {
        bail!("ffmpeg not found in PATH; install it or use --format wav");
    }
    Ok(Arc::new(transform))
}

fn write_report<T: Serialize>(path: Option<&Path>, report: &T) -> Result<()> {
    if let Some(path) = path {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

async fn run_wiki(mut config: IngestConfig, args: WikiArgs) -> Result<()> {
    if let Some(prefix) = args.prefix {
        config.output.prefix = prefix;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(bitrate) = args.bitrate {
        config.output.bitrate = bitrate;
    }
    config.validate()?;

    let output = config.output.resolve_dir(&args.input, args.output.as_deref());
    let transform: Arc<dyn AudioTransform> = if args.transcript_only {
        Arc::new(SymphoniaTransform::default())
    } else {
        audio_transform(config.output.format)?
    };

    let exporter = WikiExporter::new(config, transform);
    let report = exporter
        .run(&args.input, &output, args.transcript_only)
        .await
        .with_context(|| format!("Wiki export of {} failed", args.input.display()))?;

    info!(
        recognized = report.recognized,
        unrecognized = report.unrecognized.len(),
        converted = report.converted,
        failed = report.failed.len(),
        entities = report.entities.len(),
        "Wiki export complete"
    );
    write_report(args.report.as_deref(), &report)
}

async fn run_merge(mut config: IngestConfig, args: MergeArgs) -> Result<()> {
    if let Some(profile) = args.profile {
        config.merge.profile = profile;
    }
    if args.primary_gap_ms.is_some() {
        config.merge.primary_gap_ms = args.primary_gap_ms;
    }
    if args.secondary_gap_ms.is_some() {
        config.merge.secondary_gap_ms = args.secondary_gap_ms;
    }
    if args.unpaired_gap_ms.is_some() {
        config.merge.unpaired_gap_ms = args.unpaired_gap_ms;
    }
    if let Some(gain) = args.gain_db {
        config.merge.secondary_gain_db = gain;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    config.validate()?;

    let output = config.output.resolve_dir(&args.input, args.output.as_deref());
    let transform = audio_transform(config.output.format)?;

    let merger = BilingualMerger::new(config, transform);
    let report = merger
        .run(&args.input, &output, args.entity.as_deref())
        .await
        .with_context(|| format!("Merge of {} failed", args.input.display()))?;

    if report.written() == 0 {
        warn!("No merged track written");
    }
    info!(
        entities = report.entities.len(),
        written = report.written(),
        "Merge complete"
    );
    write_report(args.report.as_deref(), &report)
}

async fn run_convert(mut config: IngestConfig, args: ConvertArgs) -> Result<()> {
    if let Some(prefix) = args.prefix {
        config.conversion.prefix = prefix;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    config.validate()?;

    let output = args.output.clone().unwrap_or_else(|| args.input.clone());
    let transform = audio_transform(config.output.format)?;

    let report = PrefixConverter::new(config, transform)
        .run(&args.input, &output)
        .await
        .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

    info!(
        converted = report.converted.len(),
        failed = report.failed.len(),
        "Conversion complete"
    );
    Ok(())
}

async fn run_xor(mut config: IngestConfig, args: XorArgs) -> Result<()> {
    if let Some(key) = args.key {
        config.xor.key = key;
    }
    if let Some(group_size) = args.group_size {
        config.xor.group_size = group_size;
    }
    if args.no_overwrite {
        config.xor.overwrite = false;
    }
    config.validate()?;

    let input = args.input.clone();
    let xor = config.xor.clone();
    let report = tokio::task::spawn_blocking(move || xor_directory(&input, &xor))
        .await
        .context("XOR task panicked")?
        .with_context(|| format!("XOR of {} failed", args.input.display()))?;

    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        "XOR toggle complete"
    );
    Ok(())
}

async fn run_transcribe(mut config: IngestConfig, args: TranscribeArgs) -> Result<()> {
    if args.program.is_some() {
        config.transcribe.program = args.program;
    }
    if args.batch_size.is_some() {
        config.transcribe.batch_size = args.batch_size;
    }
    config.validate()?;

    let program = config
        .transcribe
        .program
        .clone()
        .context("No recognizer configured; set transcribe.program or --program")?;
    let transcriber = CommandTranscriber::locate(&program, config.transcribe.args.clone())?;

    let input = args.input.clone();
    let output = args.output.clone();
    let settings = config.transcribe.clone();
    let report = tokio::task::spawn_blocking(move || {
        transcribe_directory(&input, &output, &transcriber, &settings)
    })
    .await
    .context("Transcription task panicked")?
    .with_context(|| format!("Transcription of {} failed", args.input.display()))?;

    info!(
        processed = report.processed,
        lines = report.lines,
        failed = report.failed.len(),
        "Transcription complete"
    );
    Ok(())
}

fn run_config(config: IngestConfig, cli_path: Option<&Path>, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init { path, force } => {
            let path = match path.or_else(|| cli_path.map(Path::to_path_buf)) {
                Some(path) => path,
                None => default_config_path(CONFIG_FILE_STEM)
                    .context("No platform config directory; pass --path")?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to replace it)", path.display());
            }
            write_toml_config(&IngestConfig::default(), &path)?;
            info!("Default configuration written to {}", path.display());
        }
        ConfigCommand::Show => {
            let text = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("{}", text);
        }
    }
    Ok(())
}
