//! Configuration module for Podvault.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{InsightPrompts, ProductPrompts, Prompts, SummaryPrompts};
pub use settings::{
    Backend, EmbeddingSettings, GeneralSettings, GroupingSettings, InsightSettings, LinkSettings,
    PipelineSettings, ProductSettings, PromptSettings, Settings, StoreSettings, SummarySettings,
    TranscriptionSettings,
};
