//! OpenAI chat-completion backend.

use super::LanguageModel;
use crate::error::{Result, VaultError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based language model.
pub struct OpenAiModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAiModel {
    pub fn new() -> Self {
        Self {
            client: create_client(),
        }
    }
}

impl Default for OpenAiModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    #[instrument(skip(self, system, user), fields(model = %model))]
    async fn generate(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| VaultError::GenerationFailed(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| VaultError::GenerationFailed(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| VaultError::GenerationFailed(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VaultError::OpenAI(format!("Chat completion error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| VaultError::GenerationFailed("Empty response from model".to_string()))?;

        debug!("Generated {} characters", content.len());
        Ok(content)
    }
}
