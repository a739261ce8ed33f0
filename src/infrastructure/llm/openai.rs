use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::LlmConfig;

/// Chat completions against OpenAI. Reads `OPENAI_API_KEY` from the environment.
pub struct OpenAiLlm {
    model: String,
    temperature: f64,
}

impl OpenAiLlm {
    pub fn new(model: impl Into<String>, temperature: f64) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.model, config.temperature)
    }

    async fn prompt(&self, preamble: Option<&str>, prompt: &str) -> Result<String, DomainError> {
        let client = openai::Client::from_env();
        let mut builder = client.agent(&self.model).temperature(self.temperature);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }

        let agent = builder.build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::external(format!("{} completion failed: {e}", self.model)))
    }
}

impl Default for OpenAiLlm {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompt(None, prompt).await
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.prompt(Some(system), prompt).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
