//! Convenience re-exports for common use.

pub use crate::agent::{AgentRun, AgentSettings, Orchestrator, Termination};
pub use crate::config::QuillConfig;
pub use crate::error::{QuillError, Result};
pub use crate::provider::{ChatProvider, ChatRequest, OpenAiCompatibleProvider};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolRegistry};
pub use crate::types::{AgentRequest, Block, Message, Role, StreamEvent, ToolCallRecord};
