//! Language-model service abstraction.
//!
//! Summarization, insight extraction and product extraction all go
//! through this interface; the hosted OpenAI backend and the simulated
//! backend are interchangeable.

mod openai;
mod simulated;

pub use openai::OpenAiModel;
pub use simulated::SimulatedModel;

use crate::config::Backend;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for text generation backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a system/user prompt pair.
    async fn generate(&self, model: &str, system: &str, user: &str) -> Result<String>;
}

/// Create a language model for the configured backend.
pub fn create_model(backend: Backend) -> Arc<dyn LanguageModel> {
    match backend {
        Backend::Real => Arc::new(OpenAiModel::new()),
        Backend::Simulated => Arc::new(SimulatedModel::new()),
    }
}

/// Extract a JSON value from a model response that may wrap it in prose
/// or markdown fences.
pub fn extract_json(response: &str) -> Option<&str> {
    let start = response.find(['{', '[']);
    let end = response.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if e > s => Some(&response[s..=e]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_json_fenced() {
        let response = "Here you go:\n```json\n{\"insights\": []}\n```\nDone.";
        assert_eq!(extract_json(response), Some("{\"insights\": []}"));
    }

    #[test]
    fn test_extract_json_missing() {
        assert_eq!(extract_json("no json here"), None);
    }
}
