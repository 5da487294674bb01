//! LLM provider implementations
//!
//! ## Architecture
//!
//! - `GenaiProvider` serves genai's native providers (OpenAI, Anthropic,
//!   Gemini, Ollama, ...) and OpenAI-compatible hosts genai can route to.
//! - `OpenAiCompatProvider` speaks the chat completions wire format over
//!   reqwest, for Azure OpenAI deployments and custom endpoints.
//! - `MockProvider` gives deterministic responses for tests and offline use.
//!
//! API keys are resolved through our `SecretStore`, never through a
//! backend's own environment lookup.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod openai_compat;
mod mock;

pub use traits::{CompletionOptions, Provider, ProviderModelConfig, StreamResponse};
pub use error::{ProviderError, ProviderResult};

pub use genai_provider::GenaiProvider;
pub use genai_adapter::{is_genai_native, is_genai_supported};
pub use openai_compat::{ApiFlavor, OpenAiCompatProvider, DEFAULT_AZURE_API_VERSION, OPENAI_API_BASE};

pub use mock::{MockConfig, MockMode, MockProvider, MockStep, RecordedRequest};

use std::sync::Arc;

use crate::config::LlmSettings;
use crate::logging::Logger;
use crate::secrets::{key_hint, resolve_api_key, SecretStore};

/// Provider ids handled by [`OpenAiCompatProvider`] with a custom base URL
const COMPAT_IDS: &[&str] = &["openai-compatible", "openai_compatible", "custom"];

/// Providers that run without an API key
fn keyless(provider: &str) -> bool {
    matches!(provider, "ollama" | "mock")
}

/// Build the provider and model config described by the LLM settings
///
/// Routing:
/// - `mock` → [`MockProvider`] in echo mode
/// - `azure` → [`OpenAiCompatProvider`] with deployment addressing
/// - `openai-compatible`, or any provider with `api_base` that genai cannot
///   serve natively, → [`OpenAiCompatProvider`]
/// - everything genai supports → [`GenaiProvider`]
pub fn create_provider(
    settings: &LlmSettings,
    secrets: &dyn SecretStore,
    logger: Arc<dyn Logger>,
) -> ProviderResult<(Arc<dyn Provider>, ProviderModelConfig)> {
    let provider_id = settings.provider.to_lowercase();
    let api_key = resolve_api_key(settings, secrets);

    let mut model = ProviderModelConfig::new(&settings.model);
    model.api_key = api_key.clone();
    model.api_base = settings.api_base.clone();

    let require_key = || -> ProviderResult<()> {
        if api_key.is_none() {
            return Err(ProviderError::missing_api_key(&provider_id, key_hint(settings)));
        }
        Ok(())
    };

    let provider: Arc<dyn Provider> = match provider_id.as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        "azure" => {
            require_key()?;
            if settings.api_base.is_none() {
                return Err(ProviderError::azure_endpoint());
            }
            Arc::new(OpenAiCompatProvider::azure(settings.api_version.clone(), logger))
        }
        id if COMPAT_IDS.contains(&id) => {
            if settings.api_base.is_none() {
                return Err(ProviderError::missing_endpoint(id));
            }
            Arc::new(OpenAiCompatProvider::new(id, ApiFlavor::OpenAi, logger))
        }
        id if settings.api_base.is_some() && !is_genai_native(id) => {
            Arc::new(OpenAiCompatProvider::new(id, ApiFlavor::OpenAi, logger))
        }
        id if GenaiProvider::supports(id) => {
            if !keyless(id) {
                require_key()?;
            }
            Arc::new(GenaiProvider::new(id, logger))
        }
        id => return Err(ProviderError::UnknownProvider(id.to_string())),
    };

    Ok((provider, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    fn settings(provider: &str, api_base: Option<&str>) -> LlmSettings {
        LlmSettings {
            provider: provider.into(),
            api_base: api_base.map(String::from),
            ..Default::default()
        }
    }

    fn create(settings: &LlmSettings, secrets: &MemorySecretStore) -> ProviderResult<(Arc<dyn Provider>, ProviderModelConfig)> {
        create_provider(settings, secrets, Arc::new(NoOpLogger))
    }

    #[test]
    fn test_mock_needs_no_key() {
        let (provider, _) = create(&settings("mock", None), &MemorySecretStore::new()).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_azure_routing() {
        let secrets = MemorySecretStore::new().with_secret("azure", "k");
        let (provider, model) = create(&settings("azure", Some("https://r.openai.azure.com")), &secrets).unwrap();
        assert_eq!(provider.name(), "azure");
        assert_eq!(model.api_key.as_deref(), Some("k"));

        assert!(matches!(
            create(&settings("azure", None), &secrets),
            Err(ProviderError::MissingEndpoint { .. })
        ));
        assert!(matches!(
            create(&settings("azure", Some("https://r")), &MemorySecretStore::new()),
            Err(ProviderError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_genai_routing() {
        let secrets = MemorySecretStore::new().with_secret("openai", "sk");
        let (provider, model) = create(&settings("openai", None), &secrets).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(model.model, "gpt-4o");

        match create(&settings("anthropic", None), &secrets) {
            Err(err) => assert!(err.to_string().contains("ANTHROPIC_API_KEY")),
            Ok(_) => panic!("anthropic without a key should fail"),
        }

        assert!(create(&settings("ollama", None), &MemorySecretStore::new()).is_ok());
    }

    #[test]
    fn test_custom_endpoints() {
        let none = MemorySecretStore::new();
        let (provider, _) = create(&settings("openai-compatible", Some("http://localhost:8000/v1")), &none).unwrap();
        assert_eq!(provider.name(), "openai-compatible");

        let (provider, _) = create(&settings("vllm", Some("http://localhost:8000/v1")), &none).unwrap();
        assert_eq!(provider.name(), "vllm");

        assert!(matches!(
            create(&settings("vllm", None), &none),
            Err(ProviderError::UnknownProvider(_))
        ));
        assert!(matches!(
            create(&settings("openai-compatible", None), &none),
            Err(ProviderError::MissingEndpoint { .. })
        ));
    }
}
