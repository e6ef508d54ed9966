//! Generation backend: the capability the pipeline drives.
//!
//! The driver and the authoring routine only see [`GenerationBackend`]. The
//! concrete provider clients are composed behind it by [`ProviderBackend`].

use crate::error::GenerationError;
use crate::provider::{
    ChatMessage, CompletionOptions, DiagramClient, ModelProviderClient,
};
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for `prompt`. Empty output is an error.
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Render `prompt` into image bytes.
    async fn generate_diagram(&self, prompt: &str) -> Result<Vec<u8>, GenerationError>;
}

/// One text client and an optional diagram client.
pub struct ProviderBackend {
    text: Box<dyn ModelProviderClient>,
    options: CompletionOptions,
    diagram: Option<Box<dyn DiagramClient>>,
}

impl ProviderBackend {
    pub fn new(text: Box<dyn ModelProviderClient>, options: CompletionOptions) -> Self {
        Self {
            text,
            options,
            diagram: None,
        }
    }

    pub fn with_diagram_client(mut self, diagram: Box<dyn DiagramClient>) -> Self {
        self.diagram = Some(diagram);
        self
    }

    pub fn text_provider(&self) -> &str {
        self.text.provider_name()
    }

    pub fn has_diagram_client(&self) -> bool {
        self.diagram.is_some()
    }
}

#[async_trait]
impl GenerationBackend for ProviderBackend {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(
            provider = self.text.provider_name(),
            model = self.text.model_name(),
            prompt_chars = prompt.len(),
            "Requesting text generation"
        );
        let response = self
            .text
            .complete(vec![ChatMessage::user(prompt)], self.options.clone())
            .await?;
        if response.content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse(format!(
                "{} returned no text (finish reason: {})",
                self.text.provider_name(),
                response.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        debug!(
            completion_tokens = response.usage.completion_tokens,
            "Text generation completed"
        );
        Ok(response.content)
    }

    async fn generate_diagram(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let client = self.diagram.as_ref().ok_or_else(|| {
            GenerationError::NotConfigured("no diagram backend configured".to_string())
        })?;
        debug!(provider = client.provider_name(), "Requesting diagram render");
        client.render(prompt).await
    }
}
