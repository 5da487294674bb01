//! Tool management module
//!
//! Tools come from two places: local tools implemented in process and tool
//! providers (MCP servers, or local groups behind the same boundary).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  ToolExecutor                │  name + arguments -> result text
//! └──────────────────────────────┘
//!        │ resolve        │ dispatch
//!        ▼                ▼
//! ┌──────────────┐  ┌──────────────────────────┐
//! │ ToolRegistry │◄─│ ToolProviderMultiplexer   │
//! │ name->handler│  │ provider handles (mutex)  │
//! └──────────────┘  └──────────────────────────┘
//!                          │ tools/list, tools/call
//!                          ▼
//!                   MCP servers (stdio, HTTP)
//! ```

mod error;
mod executor;
mod local;
mod multiplexer;
mod normalize;
mod provider;
mod registry;

pub use error::{ToolError, ToolResult};
pub use executor::{parse_arguments, ToolExecutor};
pub use local::{FnTool, LocalTool, LocalToolError, LocalToolProvider, LocalToolResult};
pub use multiplexer::{ConnectOutcome, ConnectReport, ToolProviderMultiplexer};
pub use normalize::{normalize_provider_output, normalize_value, EMPTY_RESULT_PLACEHOLDER};
pub use provider::{ProviderOutput, ToolProvider};
pub use registry::{validate_schema, ToolHandler, ToolRegistry, LOCAL_OWNER};
