//! Configuration settings for Podvault.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub grouping: GroupingSettings,
    pub summary: SummarySettings,
    pub insights: InsightSettings,
    pub products: ProductSettings,
    pub links: LinkSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub pipeline: PipelineSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for downloaded audio files.
    pub audio_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.podvault".to_string(),
            audio_dir: "/tmp/podvault/audio".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Backend selection for an external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Real hosted service.
    #[default]
    Real,
    /// Deterministic in-process stand-in (demo/testing).
    Simulated,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "real" => Ok(Backend::Real),
            "simulated" | "sim" => Ok(Backend::Simulated),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Backend to use (real = AssemblyAI, simulated).
    pub backend: Backend,
    /// Maximum media duration to process (in seconds).
    pub max_duration_seconds: u32,
    /// Total wait budget for a remote transcription job (in seconds).
    pub wait_budget_seconds: u64,
    /// Poll interval while a job is running (in seconds).
    pub poll_interval_seconds: u64,
    /// Expected number of speakers (hint for diarization).
    pub speakers_expected: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Real,
            max_duration_seconds: 14400, // 4 hours
            wait_budget_seconds: 1800,
            poll_interval_seconds: 5,
            speakers_expected: 2,
        }
    }
}

/// Segment grouping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingSettings {
    /// Maximum combined character budget per group.
    pub max_group_chars: usize,
}

impl Default for GroupingSettings {
    fn default() -> Self {
        Self {
            max_group_chars: 6000,
        }
    }
}

/// Episode summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// LLM model for summary generation.
    pub model: String,
    /// Minimum target word count.
    pub min_words: usize,
    /// Maximum target word count.
    pub max_words: usize,
    /// Attempts before surfacing a generation failure.
    pub max_attempts: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            min_words: 150,
            max_words: 250,
            max_attempts: 3,
        }
    }
}

/// Insight extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// LLM model for insight extraction.
    pub model: String,
    /// Maximum concurrent segment groups in flight.
    pub max_concurrent_groups: usize,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_concurrent_groups: 3,
        }
    }
}

/// Product extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSettings {
    /// LLM model for candidate product name extraction.
    pub model: String,
    /// Merge near-miss names (edit distance 1) into existing products.
    /// Off by default: exact normalized match only.
    pub fuzzy_matching: bool,
}

impl Default for ProductSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            fuzzy_matching: false,
        }
    }
}

/// Link extraction and enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Enrich extracted links by fetching page metadata.
    pub enrich: bool,
    /// Per-fetch timeout in seconds.
    pub fetch_timeout_seconds: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            enrich: true,
            fetch_timeout_seconds: 10,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Backend to use (real = OpenAI, simulated).
    pub backend: Backend,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions (pipeline-wide constant).
    pub dimensions: u32,
    /// Retry attempts for transient backend errors.
    pub max_attempts: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Real,
            model: "text-embedding-3-large".to_string(),
            dimensions: 3072,
            max_attempts: 4,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.podvault/vault.db".to_string(),
        }
    }
}

/// Pipeline orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// LLM backend for summary/insight/product stages (real = OpenAI, simulated).
    pub llm_backend: Backend,
    /// Automatically resume a failed episode when `process` is re-invoked.
    /// Off by default: failed episodes require an explicit `resume`.
    pub auto_resume: bool,
    /// Keep downloaded audio files after processing.
    pub keep_audio: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            llm_backend: Backend::Real,
            auto_resume: false,
            keep_audio: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VaultError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podvault")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded audio directory path.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.audio_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dimensions, 3072);
        assert_eq!(settings.summary.min_words, 150);
        assert_eq!(settings.summary.max_words, 250);
        assert!(!settings.products.fuzzy_matching);
        assert!(!settings.pipeline.auto_resume);
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
            [embedding]
            backend = "simulated"
            dimensions = 8

            [pipeline]
            auto_resume = true
        "#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.embedding.backend, Backend::Simulated);
        assert_eq!(settings.embedding.dimensions, 8);
        assert!(settings.pipeline.auto_resume);
        // Untouched sections keep defaults
        assert_eq!(settings.grouping.max_group_chars, 6000);
    }
}
