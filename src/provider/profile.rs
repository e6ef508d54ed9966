//! Provider profiles: the configuration shape for text and diagram backends.

use super::{CompletionOptions, ModelProvider};
use serde::{Deserialize, Serialize};

pub const DIAGRAM_API_KEY_ENV: &str = "ERASER_API_KEY";
const DIAGRAM_API_KEY_ENV_LEGACY: &str = "ERASERIO_API_KEY";

pub const DEFAULT_DIAGRAM_ENDPOINT: &str = "https://app.eraser.io/api/render/prompt";
const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Gemini,
    OpenRouter,
    LmStudio,
}

pub fn provider_type_slug(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::OpenAI => "openai",
        ProviderType::Anthropic => "anthropic",
        ProviderType::Gemini => "gemini",
        ProviderType::OpenRouter => "openrouter",
        ProviderType::LmStudio => "lmstudio",
    }
}

impl ProviderType {
    /// Environment variable consulted when the profile carries no api_key.
    pub fn api_key_env_var(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderType::LmStudio => None,
        }
    }

    fn requires_api_key(self) -> bool {
        !matches!(self, ProviderType::LmStudio)
    }
}

/// Text provider configuration (`[text]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; required for LM Studio, optional override otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub default_options: CompletionOptions,
}

fn default_provider_type() -> ProviderType {
    ProviderType::Gemini
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_request_timeout_secs() -> u64 {
    super::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
            default_options: CompletionOptions::default(),
        }
    }
}

impl ProviderConfig {
    /// API key from the profile, falling back to the provider's env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.provider_type
                    .api_key_env_var()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.trim().is_empty())
            })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() && self.provider_type != ProviderType::LmStudio {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !is_http_url(endpoint) {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if self.provider_type == ProviderType::LmStudio && self.endpoint.is_none() {
            return Err("LM Studio requires an endpoint (e.g. http://localhost:1234)".to_string());
        }
        if self.provider_type.requires_api_key() && self.resolve_api_key().is_none() {
            return Err(format!(
                "API key required for {}; set api_key or {}",
                provider_type_slug(self.provider_type),
                self.provider_type.api_key_env_var().unwrap_or("the provider env var")
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, String> {
        self.validate()?;
        let api_key = self.resolve_api_key();
        let model = self.model.clone();
        Ok(match self.provider_type {
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: api_key.unwrap_or_default(),
                base_url: self.endpoint.clone(),
            },
            ProviderType::Anthropic => ModelProvider::Anthropic {
                model,
                api_key: api_key.unwrap_or_default(),
            },
            ProviderType::Gemini => ModelProvider::Gemini {
                model,
                api_key: api_key.unwrap_or_default(),
            },
            ProviderType::OpenRouter => ModelProvider::LocalCustom {
                model,
                endpoint: self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| OPENROUTER_ENDPOINT.to_string()),
                api_key,
            },
            ProviderType::LmStudio => ModelProvider::LocalCustom {
                model,
                endpoint: lmstudio_base_url(self.endpoint.as_deref().unwrap_or_default()),
                api_key,
            },
        })
    }
}

/// LM Studio is configured with its server root; chat lives under /v1.
fn lmstudio_base_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Diagram backend configuration (`[diagram]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramConfig {
    #[serde(default = "default_diagram_endpoint")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Extension of rendered image files
    #[serde(default = "default_image_extension")]
    pub image_extension: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_diagram_endpoint() -> String {
    DEFAULT_DIAGRAM_ENDPOINT.to_string()
}

fn default_image_extension() -> String {
    "png".to_string()
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            endpoint: default_diagram_endpoint(),
            api_key: None,
            image_extension: default_image_extension(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DiagramConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(DIAGRAM_API_KEY_ENV).ok())
            .or_else(|| std::env::var(DIAGRAM_API_KEY_ENV_LEGACY).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if !is_http_url(&self.endpoint) {
            return Err(format!("Invalid diagram endpoint URL: {}", self.endpoint));
        }
        let extension = self.image_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains('/') {
            return Err(format!(
                "Invalid diagram image extension: '{}'",
                self.image_extension
            ));
        }
        Ok(())
    }
}
