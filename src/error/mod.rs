//! Error types for quill.

use thiserror::Error;

/// Primary error type for all quill operations.
#[derive(Error, Debug)]
pub enum QuillError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Canceled")]
    Canceled,
}

impl QuillError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error came from talking to the upstream endpoint.
    ///
    /// Transport errors end the current round; everything else is handled
    /// closer to where it happened.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Api { .. }
                | Self::Authentication(_)
                | Self::RateLimited { .. }
                | Self::Timeout(_)
                | Self::Stream(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, QuillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(QuillError::api(502, "bad gateway").is_transport());
        assert!(QuillError::Timeout(10).is_transport());
        assert!(QuillError::Stream("eof".into()).is_transport());
        assert!(!QuillError::InvalidArgument("x".into()).is_transport());
        assert!(!QuillError::Canceled.is_transport());
    }

    #[test]
    fn display_includes_status() {
        let err = QuillError::api(401, "nope");
        assert_eq!(err.to_string(), "API error (status 401): nope");
    }
}
