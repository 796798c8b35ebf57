//! Error taxonomy for channel and routing operations.

use thiserror::Error;

/// Failure of a channel lifecycle or message routing operation.
///
/// Nothing here is retried by this crate; callers decide retry policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Backend credentials are absent. Raised before any backend call.
    #[error("Chat service not configured")]
    NotConfigured,

    /// Missing or malformed input, with a field-specific message.
    #[error("{0}")]
    Validation(String),

    /// The messaging backend call itself failed.
    #[error("Chat backend error: {0}")]
    Backend(String),
}

impl ChannelError {
    pub fn validation(message: impl Into<String>) -> Self {
        ChannelError::Validation(message.into())
    }

    /// Wrap a backend failure, keeping the full context chain in the message
    pub fn backend(err: anyhow::Error) -> Self {
        ChannelError::Backend(format!("{:#}", err))
    }
}

pub type ChannelResult<T> = std::result::Result<T, ChannelError>;
