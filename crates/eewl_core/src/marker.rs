//! Block markers and generation tag rotation.

use std::fmt;

/// The marker byte at the base of every block.
///
/// `0xFF` ([`Marker::FREE`]) means the block holds no valid data; any other
/// value marks the block valid and doubles as a generation tag. Tags only
/// hint at recency: recovery decides which block is newer from block
/// positions, not from tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker(u8);

impl Marker {
    /// The free sentinel: the block holds no valid data.
    pub const FREE: Marker = Marker(0xFF);

    /// Substitute tag used when rotation would produce [`Marker::FREE`], and
    /// the seed tag of an empty buffer.
    pub const FALLBACK: Marker = Marker(0xFE);

    /// Wraps a raw marker byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Returns the raw marker byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Returns `true` if this is the free sentinel.
    #[must_use]
    pub const fn is_free(self) -> bool {
        self.0 == Self::FREE.0
    }

    /// Computes the tag that follows this one.
    ///
    /// Shifts left by one, sets the low bit and substitutes
    /// [`Marker::FALLBACK`] for the free sentinel. The result is never free
    /// and never equal to `self`.
    #[must_use]
    pub const fn next(self) -> Self {
        let tag = (self.0 << 1) | 1;
        if tag == Self::FREE.0 {
            Self::FALLBACK
        } else {
            Self(tag)
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}
