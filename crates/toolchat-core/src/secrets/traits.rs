//! Secret store trait

/// Read access to API keys
///
/// Keys are either provider ids (`"azure"`) or environment variable names
/// (`"AZURE_OPENAI_API_KEY"`); how a store interprets them is up to the
/// store. Empty values are treated as absent.
///
/// ```
/// use toolchat_core::secrets::{MemorySecretStore, SecretStore};
///
/// let store = MemorySecretStore::new().with_secret("AZURE_API_KEY", "k-2");
/// assert_eq!(store.first_of(&["AZURE_OPENAI_API_KEY", "AZURE_API_KEY"]).as_deref(), Some("k-2"));
/// ```
pub trait SecretStore: Send + Sync {
    /// Short name for log messages
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<String>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The first key in `keys` that has a value
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.get(k))
    }
}
