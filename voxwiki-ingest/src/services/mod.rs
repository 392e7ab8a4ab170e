//! Classification, ordering and planning services
//!
//! Data flows one way: [`FileScanner`] → [`FilenameParser`] →
//! [`GroupingIndex`] → [`sequencer`] → {[`TranscriptEmitter`],
//! [`MergePlanner`]}.

pub mod file_scanner;
pub mod filename_parser;
pub mod grouping_index;
pub mod merge_planner;
pub mod sequencer;
pub mod transcriber;
pub mod transcript_emitter;

pub use file_scanner::{FileScanner, ScanError, ScanResult};
pub use filename_parser::{FilenameParser, ParsedFilename, TokenKind};
pub use grouping_index::{EntityGroup, GroupingIndex};
pub use merge_planner::{MergeEntry, MergePlan, MergePlanner, MergeProfile, MergeTiming};
pub use sequencer::{sequence, without_encounters, Section};
pub use transcriber::{CommandTranscriber, Transcriber};
pub use transcript_emitter::{OutputNaming, TranscriptEmitter};
