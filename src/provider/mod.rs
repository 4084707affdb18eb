//! Upstream chat-completion provider trait and implementation.

pub mod http;
pub mod openai;

pub use openai::OpenAiCompatibleProvider;

use async_trait::async_trait;

use crate::error::QuillError;
use crate::stream::ByteStream;
use crate::types::Message;

/// A request sent to the upstream model.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDefinition>>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: None,
        }
    }

    /// Attach a tool catalog. An empty catalog is sent as no tools at all.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = (!tools.is_empty()).then_some(tools);
        self
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The upstream chat-completion endpoint.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Streaming completion. Returns the raw response body; framing is
    /// decoded by [`crate::stream::decode_frames`].
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ByteStream, QuillError>;

    /// Non-streaming completion returning the full message text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, QuillError>;
}
