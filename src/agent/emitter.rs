//! Maintains the block sequence of an assistant turn.
//!
//! Every mutation returns the outward [`StreamEvent`] describing it so the
//! caller can forward it immediately.

use crate::types::{Block, StreamEvent};

/// Ordered blocks for one assistant turn.
///
/// Consecutive thinking or text increments coalesce into the trailing block
/// of the same type; a tool result replaces the latest `tool_start` of the
/// same tool in place.
#[derive(Debug, Default, Clone)]
pub struct BlockEmitter {
    blocks: Vec<Block>,
}

impl BlockEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn thinking(&mut self, delta: &str) -> StreamEvent {
        let index = match self.blocks.last_mut() {
            Some(Block::Thinking { content }) => {
                content.push_str(delta);
                self.blocks.len() - 1
            }
            _ => self.push(Block::Thinking {
                content: delta.to_string(),
            }),
        };
        StreamEvent::Thinking {
            index,
            content: delta.to_string(),
        }
    }

    pub fn text(&mut self, delta: &str) -> StreamEvent {
        let index = match self.blocks.last_mut() {
            Some(Block::Text { content }) => {
                content.push_str(delta);
                self.blocks.len() - 1
            }
            _ => self.push(Block::Text {
                content: delta.to_string(),
            }),
        };
        StreamEvent::Text {
            index,
            content: delta.to_string(),
        }
    }

    pub fn tool_start(&mut self, name: &str, label: &str, args: &str) -> StreamEvent {
        let index = self.push(Block::ToolStart {
            name: name.to_string(),
            label: label.to_string(),
            args: args.to_string(),
        });
        StreamEvent::ToolStart {
            index,
            name: name.to_string(),
            label: label.to_string(),
            args: args.to_string(),
        }
    }

    /// Appended when no matching `tool_start` exists.
    pub fn tool_result(&mut self, name: &str, label: &str, result: &str) -> StreamEvent {
        let block = Block::ToolResult {
            name: name.to_string(),
            label: label.to_string(),
            result: result.to_string(),
        };
        let index = match self.blocks.iter().rposition(|b| b.is_tool_start_for(name)) {
            Some(index) => {
                self.blocks[index] = block;
                index
            }
            None => self.push(block),
        };
        StreamEvent::ToolResult {
            index,
            name: name.to_string(),
            label: label.to_string(),
            result: result.to_string(),
        }
    }

    fn push(&mut self, block: Block) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }
}
