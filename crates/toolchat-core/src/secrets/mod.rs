//! Secret lookup for LLM API keys
//!
//! - `SecretStore` trait for implementing custom stores
//! - Built-in implementations: `EnvSecretStore`, `MemorySecretStore`

mod traits;
mod env_store;
mod memory_store;
mod resolve;

pub use traits::SecretStore;
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use resolve::{key_hint, resolve_api_key};
