//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::arguments::ToolArguments;
use super::types::AgentToolParameters;
use crate::error::QuillError;
use crate::provider::{ChatProvider, ChatRequest};
use crate::types::Message;

/// Context available during tool execution.
#[derive(Clone)]
pub struct ToolContext {
    /// Upstream used for the tool's own (non-streaming) completion.
    pub provider: Arc<dyn ChatProvider>,
    /// Id of the call being answered.
    pub call_id: String,
    /// Wall-clock time the call started.
    pub now: DateTime<Utc>,
}

impl ToolContext {
    /// Run a one-message, non-streaming completion and return its text.
    pub async fn complete(&self, prompt: impl Into<String>) -> Result<String, QuillError> {
        self.provider
            .complete(&ChatRequest::new(vec![Message::user(prompt)]))
            .await
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("provider", &self.provider.model_id())
            .field("call_id", &self.call_id)
            .field("now", &self.now)
            .finish()
    }
}

/// Core tool trait — implement to create custom tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Short human-readable label shown to the client.
    fn label(&self) -> &str;

    /// Description sent to the model.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &AgentToolParameters;

    /// Execute the tool with parsed arguments, returning the result text.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<String, QuillError>;
}

/// Type alias for the tool handler function.
type ToolHandler = dyn Fn(ToolArguments, ToolContext) -> Pin<Box<dyn Future<Output = Result<String, QuillError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct AgentTool {
    name: String,
    label: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, QuillError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<String, QuillError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish()
    }
}
