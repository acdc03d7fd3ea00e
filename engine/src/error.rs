use retrovote_client::ApiError;
use retrovote_crypto::CryptoError;
use thiserror::Error;

/// Why one account's workflow ended without success.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to sign challenge: {0}")]
    Signing(#[from] CryptoError),

    #[error("remote call failed: {0}")]
    Api(#[from] ApiError),

    #[error("no available votes")]
    NoAvailableVotes,

    #[error("no projects to vote for")]
    NoProjects,

    #[error("no unconfirmed votes")]
    NoUnconfirmedVotes,

    #[error("failed to record eligible account: {0}")]
    Recorder(String),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("concurrency limit must be at least 1, got {0}")]
    InvalidConcurrency(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
