//! Error types for eewl core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in buffer operations.
///
/// Buffer corruption is not an error: [`crate::WearLevelBuffer::begin`]
/// repairs it by reformatting and reports it in its
/// [`crate::RecoveryReport`]. Absence of data is `None`, not an error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Medium access or medium initialization failed.
    #[error("medium error: {0}")]
    Medium(#[from] eewl_medium::MediumError),

    /// The buffer configuration cannot describe a valid layout.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A payload does not have the record size fixed at construction.
    #[error("payload size mismatch: expected {expected} bytes, got {actual}")]
    PayloadSize {
        /// Record size of the buffer.
        expected: usize,
        /// Size of the supplied payload.
        actual: usize,
    },

    /// The buffer has not been scanned since construction or since a failed write.
    #[error("buffer not started: call begin() first")]
    NotStarted,
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a payload size mismatch error.
    pub fn payload_size(expected: usize, actual: usize) -> Self {
        Self::PayloadSize { expected, actual }
    }
}
