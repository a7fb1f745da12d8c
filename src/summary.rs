//! Episode-level summarization.

use crate::config::{Prompts, SummarySettings};
use crate::error::{Result, VaultError};
use crate::llm::LanguageModel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Generates an episode summary constrained to a target word range.
pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    settings: SummarySettings,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts, settings: SummarySettings) -> Self {
        Self {
            model,
            prompts,
            settings,
        }
    }

    /// Summarize the full ordered transcript text.
    ///
    /// Model errors and empty responses are retried up to the configured
    /// attempt count before surfacing as `GenerationFailed`. An on-topic
    /// summary outside the word range is also retried, but the final
    /// attempt is accepted with a warning rather than failing the episode.
    #[instrument(skip(self, transcript))]
    pub async fn summarize(&self, transcript: &str) -> Result<String> {
        if transcript.trim().is_empty() {
            return Err(VaultError::GenerationFailed(
                "No transcript text to summarize".to_string(),
            ));
        }

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        vars.insert("min_words".to_string(), self.settings.min_words.to_string());
        vars.insert("max_words".to_string(), self.settings.max_words.to_string());

        let system = Prompts::render(&self.prompts.summary.system, &vars);
        let user = Prompts::render(&self.prompts.summary.user, &vars);

        let attempts = self.settings.max_attempts.max(1);
        let mut last_err: Option<VaultError> = None;

        for attempt in 1..=attempts {
            match self.model.generate(&self.settings.model, &system, &user).await {
                Ok(text) => {
                    let summary = text.trim().to_string();
                    if summary.is_empty() {
                        last_err = Some(VaultError::GenerationFailed(
                            "Model returned empty summary".to_string(),
                        ));
                        continue;
                    }

                    let words = summary.split_whitespace().count();
                    let in_range =
                        (self.settings.min_words..=self.settings.max_words).contains(&words);

                    if in_range || attempt == attempts {
                        if !in_range {
                            warn!(
                                "Accepting summary with {} words (target {}-{})",
                                words, self.settings.min_words, self.settings.max_words
                            );
                        }
                        info!("Generated summary ({} words)", words);
                        return Ok(summary);
                    }

                    warn!(
                        "Summary attempt {} had {} words (target {}-{}), retrying",
                        attempt, words, self.settings.min_words, self.settings.max_words
                    );
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!("Summary attempt {} failed, retrying: {}", attempt, e);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            VaultError::GenerationFailed("Summary generation exhausted attempts".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SimulatedModel;

    fn summarizer() -> Summarizer {
        Summarizer::new(
            Arc::new(SimulatedModel::new()),
            Prompts::default(),
            SummarySettings::default(),
        )
    }

    #[tokio::test]
    async fn test_summary_within_word_range() {
        let transcript = "Speaker A: talks about frameworks.\nSpeaker B: pushes back.";
        let summary = summarizer().summarize(transcript).await.unwrap();

        let words = summary.split_whitespace().count();
        assert!((150..=250).contains(&words), "word count was {}", words);
    }

    #[tokio::test]
    async fn test_empty_transcript_fails() {
        let result = summarizer().summarize("   ").await;
        assert!(matches!(result, Err(VaultError::GenerationFailed(_))));
    }
}
