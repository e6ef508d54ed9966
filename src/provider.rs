//! Model Provider Abstraction
//!
//! Provider clients for the text and diagram backends. Text providers share one
//! chat-completion interface (OpenAI-compatible endpoints, Anthropic, Gemini);
//! diagram providers render a prompt into image bytes. The pipeline never talks
//! to these directly; see [`crate::backend`].

use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod anthropic;
pub mod eraser;
pub mod gemini;
pub mod openai;
pub mod profile;

pub use anthropic::AnthropicClient;
pub use eraser::EraserClient;
pub use gemini::GeminiClient;
pub use openai::OpenAICompatibleClient;
pub use profile::{DiagramConfig, ProviderConfig, ProviderType};

/// Resolved provider selection, ready to build a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>,
    },
    Anthropic {
        model: String,
        api_key: String,
    },
    Gemini {
        model: String,
        api_key: String,
    },
    /// Any OpenAI-compatible server (OpenRouter, LM Studio, ...).
    LocalCustom {
        model: String,
        endpoint: String,
        api_key: Option<String>,
    },
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>, // 0.0-2.0
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(1.0),
            max_tokens: None,
            top_p: None,
            stop: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Text provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GenerationError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Diagram provider client trait
#[async_trait]
pub trait DiagramClient: Send + Sync {
    /// Render a diagram prompt into image bytes
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, GenerationError>;

    fn provider_name(&self) -> &str;
}

pub(crate) fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

/// Map transport-level reqwest failures to generation errors
pub(crate) fn map_http_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout(error.to_string())
    } else if let Some(status) = error.status() {
        map_status(status.as_u16(), error.to_string())
    } else if error.is_connect() {
        GenerationError::RequestFailed(format!("Connection error: {}", error))
    } else {
        GenerationError::RequestFailed(format!("HTTP error: {}", error))
    }
}

/// Map a non-success HTTP status and its body to a generation error
pub(crate) fn map_status(status: u16, body: String) -> GenerationError {
    match status {
        401 | 403 => GenerationError::AuthFailed(body),
        404 => GenerationError::ModelNotFound(body),
        408 | 504 => GenerationError::Timeout(body),
        429 => GenerationError::RateLimit(body),
        _ => GenerationError::RequestFailed(format!("status {}: {}", status, body)),
    }
}

/// Turn a non-success response into an error, reading its body for context
pub(crate) async fn error_for_response(response: reqwest::Response) -> GenerationError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    map_status(status, body)
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_provider_http_client(request_timeout: Duration) -> Result<Client, GenerationError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| GenerationError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}

/// Provider factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
        request_timeout: Duration,
    ) -> Result<Box<dyn ModelProviderClient>, GenerationError> {
        match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(OpenAICompatibleClient::openai(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
                request_timeout,
            )?)),
            ModelProvider::Anthropic { model, api_key } => Ok(Box::new(AnthropicClient::new(
                model.clone(),
                api_key.clone(),
                request_timeout,
            )?)),
            ModelProvider::Gemini { model, api_key } => Ok(Box::new(GeminiClient::new(
                model.clone(),
                api_key.clone(),
                request_timeout,
            )?)),
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Box::new(OpenAICompatibleClient::custom(
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
                request_timeout,
            )?)),
        }
    }

    pub fn create_diagram_client(
        config: &DiagramConfig,
    ) -> Result<Box<dyn DiagramClient>, GenerationError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GenerationError::NotConfigured(format!(
                "Diagram API key missing; set diagram.api_key or {}",
                profile::DIAGRAM_API_KEY_ENV
            ))
        })?;
        Ok(Box::new(EraserClient::new(
            config.endpoint.clone(),
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )?))
    }
}
