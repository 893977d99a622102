//! In-memory engine state.

use crate::geometry::NO_BLOCK;
use crate::marker::Marker;

/// Which block is current and which tag it carries.
///
/// Produced by the recovery scan, advanced by every successful put and reset
/// by a format. Outside of an in-progress put at most one block on the medium
/// carries a non-free marker, and it is `current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    /// Base address of the block holding the record, `None` when empty.
    pub current: Option<usize>,
    /// Tag most recently written or found, seed for the next tag.
    pub last_marker: Marker,
}

impl EngineState {
    /// State of a buffer with no valid data.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            current: None,
            last_marker: Marker::FALLBACK,
        }
    }

    /// State of a buffer whose record lives at `address` with tag `marker`.
    #[must_use]
    pub const fn at(address: usize, marker: Marker) -> Self {
        Self {
            current: Some(address),
            last_marker: marker,
        }
    }

    /// Current block address, with [`NO_BLOCK`] standing for "none".
    #[must_use]
    pub fn current_address(&self) -> usize {
        self.current.unwrap_or(NO_BLOCK)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::empty()
    }
}
