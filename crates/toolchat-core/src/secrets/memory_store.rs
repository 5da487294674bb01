//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::SecretStore;

/// Secrets held in memory, for tests and for embedding applications that
/// obtain keys themselves
///
/// `Debug` lists key names only.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.secrets.write().remove(key)
    }
}

impl std::fmt::Debug for MemorySecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secrets = self.secrets.read();
        let mut keys: Vec<&str> = secrets.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("MemorySecretStore").field("keys", &keys).finish()
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).filter(|v| !v.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let store = MemorySecretStore::new().with_secret("openai", "sk-1");
        assert!(store.has("openai"));
        assert_eq!(store.remove("openai").as_deref(), Some("sk-1"));
        assert!(!store.has("openai"));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let store = MemorySecretStore::new().with_secret("groq", "");
        assert!(store.get("groq").is_none());
    }

    #[test]
    fn test_debug_hides_values() {
        let store = MemorySecretStore::new()
            .with_secret("azure", "very-secret")
            .with_secret("openai", "sk-also-secret");
        let shown = format!("{:?}", store);
        assert!(shown.contains("azure"));
        assert!(!shown.contains("very-secret"));
        assert!(!shown.contains("sk-also-secret"));
    }
}
