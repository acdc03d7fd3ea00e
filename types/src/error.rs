//! Top-level error type for domain type construction.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("unknown workflow: {0} (expected record, vote or delete)")]
    UnknownWorkflow(String),

    #[error("allocation has no entries")]
    EmptyAllocation,

    #[error("allocation entry for {project} has non-positive count {count}")]
    NonPositiveCount { project: String, count: i64 },
}
