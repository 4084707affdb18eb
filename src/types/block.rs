//! Client-visible units of assistant output.

use serde::{Deserialize, Serialize};

/// One coalesced unit of an assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Thinking {
        content: String,
    },
    ToolStart {
        name: String,
        label: String,
        args: String,
    },
    ToolResult {
        name: String,
        label: String,
        result: String,
    },
    Text {
        content: String,
    },
}

impl Block {
    /// Whether this block is a `tool_start` for `tool_name`.
    pub fn is_tool_start_for(&self, tool_name: &str) -> bool {
        matches!(self, Block::ToolStart { name, .. } if name == tool_name)
    }
}
