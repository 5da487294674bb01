//! Errors at the LLM boundary

use thiserror::Error;

/// Why a completion request produced no usable response
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no API key for {provider} (set {hint})")]
    MissingApiKey { provider: String, hint: String },

    #[error("{provider} needs llm.api_base{}", example_suffix(.example))]
    MissingEndpoint {
        provider: String,
        example: Option<&'static str>,
    },

    #[error("unknown provider '{0}' (set llm.api_base for an OpenAI-compatible endpoint)")]
    UnknownProvider(String),

    /// The endpoint answered with a non-success status
    #[error("{provider} returned {status}: {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} rate limited the request: {message}")]
    RateLimited { provider: String, message: String },

    /// The request could not be started
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// The response stream broke off after it started
    #[error("{provider} stream failed: {message}")]
    Stream { provider: String, message: String },

    #[error("unexpected response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

fn example_suffix(example: &Option<&'static str>) -> String {
    example.map(|e| format!(" ({})", e)).unwrap_or_default()
}

impl ProviderError {
    pub fn missing_api_key(provider: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
            hint: hint.into(),
        }
    }

    pub fn missing_endpoint(provider: impl Into<String>) -> Self {
        Self::MissingEndpoint {
            provider: provider.into(),
            example: None,
        }
    }

    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn stream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// The Azure endpoint error, with the expected URL shape
    pub(crate) fn azure_endpoint() -> Self {
        Self::MissingEndpoint {
            provider: "azure".into(),
            example: Some("https://<resource>.openai.azure.com"),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_messages() {
        assert_eq!(
            ProviderError::missing_endpoint("vllm").to_string(),
            "vllm needs llm.api_base"
        );
        assert_eq!(
            ProviderError::azure_endpoint().to_string(),
            "azure needs llm.api_base (https://<resource>.openai.azure.com)"
        );
    }

    #[test]
    fn test_key_hint_in_message() {
        let err = ProviderError::missing_api_key("azure", "AZURE_OPENAI_API_KEY or AZURE_API_KEY");
        assert!(err.to_string().contains("AZURE_OPENAI_API_KEY"));
    }
}
