//! Block layout of a circular buffer.

use crate::error::{CoreError, CoreResult};

/// Address reserved to mean "no current block".
pub const NO_BLOCK: usize = 0;

/// Immutable layout of a buffer on its medium.
///
/// `block_count` blocks of `block_size` bytes lie contiguously from
/// `start_address`. Each block is one marker byte followed by the payload:
///
/// ```text
/// start_address                                              end_address
/// ┌────────┬───────────┬────────┬───────────┬─────┬────────┬───────────┐
/// │marker 0│ payload 0 │marker 1│ payload 1 │ ... │marker n│ payload n │
/// └────────┴───────────┴────────┴───────────┴─────┴────────┴───────────┘
/// ```
///
/// "Next block" wraps from the last block back to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    block_size: usize,
    block_count: usize,
    start_address: usize,
    end_address: usize,
}

impl Geometry {
    /// Computes the layout for a record of `payload_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `start_address` is 0 (reserved
    /// as [`NO_BLOCK`]), `block_count` or `payload_size` is 0, or the layout
    /// overflows the address space.
    pub fn new(payload_size: usize, block_count: usize, start_address: usize) -> CoreResult<Self> {
        if start_address == NO_BLOCK {
            return Err(CoreError::invalid_config(
                "start address 0 is reserved and cannot hold a block",
            ));
        }
        if block_count == 0 {
            return Err(CoreError::invalid_config("block count must be at least 1"));
        }
        if payload_size == 0 {
            return Err(CoreError::invalid_config("payload size must be at least 1 byte"));
        }

        let block_size = payload_size
            .checked_add(1)
            .ok_or_else(|| CoreError::invalid_config("payload size overflows"))?;
        let end_address = block_size
            .checked_mul(block_count)
            .and_then(|len| len.checked_add(start_address))
            .ok_or_else(|| CoreError::invalid_config("buffer extends past the address space"))?;

        Ok(Self {
            block_size,
            block_count,
            start_address,
            end_address,
        })
    }

    /// Size of one block: marker byte plus payload.
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of payload bytes per block.
    #[must_use]
    pub const fn payload_size(&self) -> usize {
        self.block_size - 1
    }

    /// Number of blocks in rotation.
    #[must_use]
    pub const fn block_count(&self) -> usize {
        self.block_count
    }

    /// Address of the first block's marker.
    #[must_use]
    pub const fn start_address(&self) -> usize {
        self.start_address
    }

    /// First address past the last block.
    #[must_use]
    pub const fn end_address(&self) -> usize {
        self.end_address
    }

    /// Address of the last block's marker.
    #[must_use]
    pub const fn last_block_address(&self) -> usize {
        self.end_address - self.block_size
    }

    /// Base address of block `index`, or `None` if out of range.
    #[must_use]
    pub fn block_address(&self, index: usize) -> Option<usize> {
        (index < self.block_count).then(|| self.start_address + index * self.block_size)
    }

    /// Index of the block based at `address`, or `None` if `address` is not
    /// a block base address.
    #[must_use]
    pub fn block_index(&self, address: usize) -> Option<usize> {
        if address < self.start_address || address >= self.end_address {
            return None;
        }
        let offset = address - self.start_address;
        (offset % self.block_size == 0).then_some(offset / self.block_size)
    }

    /// Base address of the block following `address` in rotation order.
    #[must_use]
    pub const fn next_block(&self, address: usize) -> usize {
        let next = address + self.block_size;
        if next >= self.end_address {
            self.start_address
        } else {
            next
        }
    }

    /// Iterates over every block base address in address order.
    pub fn blocks(&self) -> impl Iterator<Item = usize> + Clone {
        (self.start_address..self.end_address).step_by(self.block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_layout() {
        let g = Geometry::new(4, 10, 0x10).unwrap();
        assert_eq!(g.block_size(), 5);
        assert_eq!(g.payload_size(), 4);
        assert_eq!(g.block_count(), 10);
        assert_eq!(g.start_address(), 0x10);
        assert_eq!(g.end_address(), 0x10 + 50);
        assert_eq!(g.last_block_address(), 0x10 + 45);
    }

    #[test]
    fn rejects_zero_start_address() {
        let result = Geometry::new(4, 10, 0);
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_zero_blocks_and_empty_payload() {
        assert!(Geometry::new(4, 0, 1).is_err());
        assert!(Geometry::new(0, 4, 1).is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(Geometry::new(usize::MAX, 2, 1).is_err());
        assert!(Geometry::new(16, usize::MAX / 4, 1).is_err());
    }

    #[test]
    fn next_block_wraps() {
        let g = Geometry::new(1, 3, 1).unwrap();
        assert_eq!(g.next_block(1), 3);
        assert_eq!(g.next_block(3), 5);
        assert_eq!(g.next_block(5), 1);
    }

    #[test]
    fn single_block_is_its_own_successor() {
        let g = Geometry::new(8, 1, 0x20).unwrap();
        assert_eq!(g.next_block(0x20), 0x20);
        assert_eq!(g.last_block_address(), 0x20);
    }

    #[test]
    fn block_index_and_address() {
        let g = Geometry::new(3, 4, 0x08).unwrap();
        assert_eq!(g.block_address(0), Some(0x08));
        assert_eq!(g.block_address(3), Some(0x14));
        assert_eq!(g.block_address(4), None);

        assert_eq!(g.block_index(0x0C), Some(1));
        assert_eq!(g.block_index(0x0D), None);
        assert_eq!(g.block_index(0x18), None);
        assert_eq!(g.block_index(0x04), None);
    }

    #[test]
    fn blocks_visits_every_base_address() {
        let g = Geometry::new(4, 10, 0x10).unwrap();
        let blocks: Vec<usize> = g.blocks().collect();
        assert_eq!(blocks.len(), 10);
        assert_eq!(blocks[0], 0x10);
        assert_eq!(blocks[9], g.last_block_address());
        assert!(blocks.windows(2).all(|w| w[1] - w[0] == 5));
    }
}
