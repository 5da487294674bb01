//! Conversation errors

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::ProviderError;

/// Errors that end a turn without a final answer
///
/// The transcript is rolled back to its state before the turn's user
/// message whenever one of these is returned from a query.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("LLM request failed: {0}")]
    LlmRequestFailure(#[from] ProviderError),

    #[error("conversation abandoned after {iterations} LLM requests without a final answer")]
    ConversationAbandoned { iterations: usize },

    #[error("turn timed out after {0:?}")]
    Timeout(Duration),

    #[error("turn cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type ChatResult<T> = Result<T, ChatError>;
