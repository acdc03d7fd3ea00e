use thiserror::Error;

/// Failure of a single remote call.
///
/// `Transport`, `Decode`, `Application` and `Incomplete` are transient and
/// retried by [`RetryPolicy`](crate::RetryPolicy); the rest are fatal for the
/// account that hit them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("unexpected response (status {status}): {message}")]
    Application { status: i64, message: String },

    #[error("incomplete response: {0}")]
    Incomplete(String),

    #[error("failed to build request payload: {0}")]
    Payload(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
}

impl ApiError {
    /// Whether the call may succeed if simply repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Decode(_) | Self::Application { .. } | Self::Incomplete(_)
        )
    }
}
