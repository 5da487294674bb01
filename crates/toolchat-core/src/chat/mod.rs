//! Conversation orchestration
//!
//! ```text
//! user query ──► ConversationOrchestrator ──► Provider (LLM)
//!                      │    ▲                     │
//!                      │    └── tool results ◄────┤ tool calls
//!                      ▼                          │
//!                 ToolExecutor ──► ToolRegistry ──┘
//! ```

mod context;
mod error;
mod orchestrator;
mod state;

pub use context::ChatContext;
pub use error::{ChatError, ChatResult};
pub use orchestrator::{ConversationOrchestrator, OrchestratorOptions};
pub use state::{ConversationState, TurnState};
