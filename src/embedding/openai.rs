//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, VaultError};
use crate::openai::create_client;
use crate::retry::{retry, RetryPolicy};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based embedder with bounded retry on transient failures.
pub struct OpenAiEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    retry_policy: RetryPolicy,
}

impl OpenAiEmbedder {
    /// Create an embedder from embedding settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self::with_config(
            &settings.model,
            settings.dimensions as usize,
            settings.max_attempts,
        )
    }

    /// Create a new OpenAI embedder with custom model and dimensions.
    pub fn with_config(model: &str, dimensions: usize, max_attempts: usize) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            dimensions,
            retry_policy: RetryPolicy::with_attempts(max_attempts),
        }
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(chunk.to_vec()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| VaultError::EmbeddingFailed(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| VaultError::EmbeddingFailed(format!("Embedding API error: {}", e)))?;

        // Sort by index to ensure correct order
        let mut embeddings: Vec<_> = response.data.into_iter().collect();
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VaultError::EmbeddingFailed("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        // OpenAI has a limit on batch size, process in chunks
        const BATCH_SIZE: usize = 100;
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let embeddings = retry(&self.retry_policy, || self.embed_chunk(chunk)).await?;
            all_embeddings.extend(embeddings);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let embedder = OpenAiEmbedder::with_config("text-embedding-3-large", 3072, 4);
        assert_eq!(embedder.dimensions(), 3072);

        let embedder = OpenAiEmbedder::from_settings(&EmbeddingSettings::default());
        assert_eq!(embedder.dimensions(), 3072);
    }
}
