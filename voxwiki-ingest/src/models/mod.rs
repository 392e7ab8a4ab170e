//! Data models for clip classification

pub mod category;
pub mod clip;
pub mod vocabulary;

pub use category::{Category, CategoryId, OTHER_EFFECTS_ORDER};
pub use clip::{ClipRecord, LanguageVariant};
pub use vocabulary::{ConditionEntry, EffectEntry, Vocabulary};
