//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No readers configured for the panel")]
    EmptyPanel,

    #[error("All readers failed to respond")]
    AllReadersFailed,

    #[error("Invalid manuscript: {0}")]
    InvalidManuscript(String),

    #[error("Session is complete; no further messages may be appended")]
    SessionComplete,

    #[error("Unknown reader: {0}")]
    UnknownReader(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
