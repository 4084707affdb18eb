//! Typed access to tool call arguments.

use crate::error::QuillError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get a required, non-blank string argument.
    pub fn get_str(&self, key: &str) -> Result<&str, QuillError> {
        self.get_str_opt(key)
            .ok_or_else(|| QuillError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument. Blank strings count as absent.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, QuillError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            QuillError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
