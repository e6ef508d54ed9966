//! Integration tests for provider selection and backend composition

use scrivener::backend::{GenerationBackend, ProviderBackend};
use scrivener::error::GenerationError;
use scrivener::provider::{
    CompletionOptions, DiagramConfig, ModelProvider, ProviderConfig, ProviderFactory,
    ProviderType, DEFAULT_REQUEST_TIMEOUT,
};

fn config(provider_type: ProviderType, model: &str) -> ProviderConfig {
    ProviderConfig {
        provider_type,
        model: model.to_string(),
        api_key: Some("test-key".to_string()),
        ..ProviderConfig::default()
    }
}

#[test]
fn each_provider_type_builds_a_client() {
    let cases = [
        (config(ProviderType::OpenAI, "gpt-4o-mini"), "openai"),
        (config(ProviderType::Anthropic, "claude-3-5-sonnet"), "anthropic"),
        (config(ProviderType::Gemini, "gemini-pro"), "gemini"),
        (config(ProviderType::OpenRouter, "meta-llama/llama-3-70b"), "local"),
    ];
    for (profile, name) in cases {
        let provider = profile.to_model_provider().unwrap();
        let client = ProviderFactory::create_client(&provider, DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), name);
        assert_eq!(client.model_name(), profile.model);
    }
}

#[test]
fn lm_studio_endpoint_gets_api_suffix() {
    let profile = ProviderConfig {
        provider_type: ProviderType::LmStudio,
        model: "qwen2.5-coder".to_string(),
        api_key: None,
        endpoint: Some("http://localhost:1234".to_string()),
        ..ProviderConfig::default()
    };
    match profile.to_model_provider().unwrap() {
        ModelProvider::LocalCustom {
            endpoint, api_key, ..
        } => {
            assert_eq!(endpoint, "http://localhost:1234/v1");
            assert!(api_key.is_none());
        }
        other => panic!("expected LocalCustom, got {:?}", other),
    }
}

#[test]
fn lm_studio_without_endpoint_is_rejected() {
    let profile = ProviderConfig {
        provider_type: ProviderType::LmStudio,
        api_key: None,
        endpoint: None,
        ..ProviderConfig::default()
    };
    assert!(profile.to_model_provider().is_err());
}

#[test]
fn diagram_client_requires_a_key() {
    let with_key = DiagramConfig {
        api_key: Some("eraser-key".to_string()),
        ..DiagramConfig::default()
    };
    let client = ProviderFactory::create_diagram_client(&with_key).unwrap();
    assert_eq!(client.provider_name(), "eraser");
}

#[tokio::test]
async fn backend_without_diagram_client_reports_not_configured() {
    let provider = config(ProviderType::OpenAI, "gpt-4o-mini")
        .to_model_provider()
        .unwrap();
    let client = ProviderFactory::create_client(&provider, DEFAULT_REQUEST_TIMEOUT).unwrap();
    let backend = ProviderBackend::new(client, CompletionOptions::default());

    assert_eq!(backend.text_provider(), "openai");
    assert!(!backend.has_diagram_client());
    assert!(matches!(
        backend.generate_diagram("boxes and arrows").await,
        Err(GenerationError::NotConfigured(_))
    ));
}
