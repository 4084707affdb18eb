//! Outward events streamed to the client.

use serde::Serialize;

/// A discrete event on the client stream.
///
/// `index` is the position of the affected block in the turn's block
/// sequence. For `thinking` and `text`, `content` is the increment to append.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Thinking {
        index: usize,
        content: String,
    },
    Text {
        index: usize,
        content: String,
    },
    ToolStart {
        index: usize,
        name: String,
        label: String,
        args: String,
    },
    ToolResult {
        index: usize,
        name: String,
        label: String,
        result: String,
    },
    Error {
        message: String,
    },
    /// Completion sentinel; encoded as the literal `[DONE]` payload.
    #[serde(skip_serializing)]
    Done,
}

impl StreamEvent {
    pub fn is_done(&self) -> bool {
        matches!(self, StreamEvent::Done)
    }
}
