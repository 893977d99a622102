//! Error types for medium operations.

use std::io;
use thiserror::Error;

/// Result type for medium operations.
pub type MediumResult<T> = Result<T, MediumError>;

/// Errors that can occur while accessing a medium.
#[derive(Debug, Error)]
pub enum MediumError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to access an address the medium does not provide.
    #[error("address {address:#x} out of range: medium capacity is {capacity} bytes")]
    OutOfRange {
        /// The requested address.
        address: usize,
        /// The current medium capacity.
        capacity: usize,
    },

    /// The one-time medium initialization failed.
    #[error("medium initialization failed: {0}")]
    InitFailed(String),

    /// A buffer ends past the bytes the initialized medium provides.
    #[error("reserved end address {requested:#x} exceeds initialized medium size {initialized:#x}")]
    BeyondInitialized {
        /// End address requested by the buffer.
        requested: usize,
        /// Bytes the medium provides after initialization.
        initialized: usize,
    },

    /// The init size hint for the reserved addresses does not fit in `usize`.
    #[error("no init size hint fits above end address {requested:#x}")]
    SizeOverflow {
        /// Highest end address reserved on the medium.
        requested: usize,
    },

    /// The medium image is owned by another process.
    #[error("medium locked: another process has exclusive access")]
    Locked,
}

impl MediumError {
    /// Creates an initialization failure error.
    pub fn init_failed(message: impl Into<String>) -> Self {
        Self::InitFailed(message.into())
    }
}
