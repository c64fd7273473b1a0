//! Errors raised by queries, mutations and the API client.

use thiserror::Error;

/// Failure reported by the generated API client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("operation `{operation}` is missing required parameter `{parameter}`")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },
    #[error("cache maintenance for mutation `{0}` is not implemented")]
    UnimplementedMutation(String),
    #[error("unknown query `{0}`")]
    UnknownQuery(String),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl QueryError {
    /// Whether the error was raised locally, before any request was sent.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            QueryError::MissingParameter { .. }
                | QueryError::UnimplementedMutation(_)
                | QueryError::UnknownQuery(_)
        )
    }
}
