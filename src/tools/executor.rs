//! Executes accumulated tool calls against the registry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::tool::ToolContext;
use crate::provider::ChatProvider;
use crate::types::ToolCallRecord;
use crate::util::timeout::with_timeout;

/// Result of running one tool call. Failures are folded into `result`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub call_id: String,
    pub name: String,
    pub label: String,
    pub result: String,
    pub is_error: bool,
}

/// Dispatches tool calls by name.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    provider: Arc<dyn ChatProvider>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, provider: Arc<dyn ChatProvider>, timeout: Duration) -> Self {
        Self {
            registry,
            provider,
            timeout,
        }
    }

    /// Client-facing label for a tool name; unknown names label themselves.
    pub fn label_for(&self, name: &str) -> String {
        self.registry
            .get(name)
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| name.to_string())
    }

    /// Run one call. Never fails: unknown tools and tool errors become result text.
    pub async fn execute(&self, call: &ToolCallRecord) -> ToolOutcome {
        let label = self.label_for(&call.name);
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "unknown tool requested");
            return ToolOutcome {
                call_id: call.id.clone(),
                name: call.name.clone(),
                label,
                result: format!("unknown tool: {}", call.name),
                is_error: true,
            };
        };

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolContext {
            provider: self.provider.clone(),
            call_id: call.id.clone(),
            now: chrono::Utc::now(),
        };

        debug!(tool = %call.name, call_id = %call.id, "executing tool");
        match with_timeout(self.timeout, tool.execute(&args, &ctx)).await {
            Ok(result) => ToolOutcome {
                call_id: call.id.clone(),
                name: call.name.clone(),
                label,
                result,
                is_error: false,
            },
            Err(err) => {
                warn!(tool = %call.name, call_id = %call.id, error = %err, "tool failed");
                ToolOutcome {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    label,
                    result: format!("Tool error: {err}"),
                    is_error: true,
                }
            }
        }
    }
}
