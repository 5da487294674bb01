//! Core types for LLM interactions
//!
//! This module contains the shared types used by providers, tools and the
//! conversation orchestrator.

mod message;
mod tool;
mod stream;
mod cancellation;

pub use message::{ChatMessage, MessageRole};
pub use tool::{ToolCallRequest, ToolChoice, ToolDescriptor};
pub use stream::{CompletionResponse, StreamChunk};
pub use cancellation::CancellationToken;
