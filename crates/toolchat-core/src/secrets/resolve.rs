//! API key resolution for the configured LLM

use crate::config::LlmSettings;
use super::env_store::EnvSecretStore;
use super::traits::SecretStore;

/// Look up the API key for the configured provider
///
/// An explicit `api_key_env` wins; otherwise the provider's default
/// variables are tried through the store.
pub fn resolve_api_key(settings: &LlmSettings, store: &dyn SecretStore) -> Option<String> {
    match settings.api_key_env.as_deref() {
        Some(var) => store.get(var),
        None => store.get(&settings.provider),
    }
}

/// Variable names a user can set to supply the key, for error messages
pub fn key_hint(settings: &LlmSettings) -> String {
    if let Some(var) = settings.api_key_env.as_deref() {
        return var.to_string();
    }
    match EnvSecretStore::env_vars_for_provider(&settings.provider) {
        Some(vars) if !vars.is_empty() => vars.join(" or "),
        _ => format!("{}_API_KEY", settings.provider.to_uppercase().replace('-', "_")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_explicit_variable_wins() {
        let store = MemorySecretStore::new()
            .with_secret("openai", "from-provider")
            .with_secret("MY_KEY", "from-var");
        let settings = LlmSettings {
            api_key_env: Some("MY_KEY".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&settings, &store).as_deref(), Some("from-var"));
    }

    #[test]
    fn test_provider_default() {
        let store = MemorySecretStore::new().with_secret("openai", "sk-test");
        assert_eq!(
            resolve_api_key(&LlmSettings::default(), &store).as_deref(),
            Some("sk-test")
        );
    }

    #[test]
    fn test_key_hint() {
        let azure = LlmSettings {
            provider: "azure".into(),
            ..Default::default()
        };
        assert_eq!(key_hint(&azure), "AZURE_OPENAI_API_KEY or AZURE_API_KEY");

        let custom = LlmSettings {
            provider: "my-llm".into(),
            ..Default::default()
        };
        assert_eq!(key_hint(&custom), "MY_LLM_API_KEY");
    }
}
