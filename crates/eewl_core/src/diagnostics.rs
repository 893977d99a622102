//! Read-only introspection of a buffer.
//!
//! Neither dump changes the engine state or the medium.

use crate::geometry::Geometry;
use crate::marker::Marker;
use crate::state::EngineState;
use eewl_medium::{Medium, MediumResult};
use std::fmt;

/// Geometry and engine state fields of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlDump {
    /// Marker byte plus payload.
    pub block_size: usize,
    /// Blocks in rotation.
    pub block_count: usize,
    /// Current block address, 0 when the buffer is empty.
    pub current_address: usize,
    /// Most recent generation tag.
    pub last_marker: Marker,
    /// Address of the first block.
    pub start_address: usize,
    /// First address past the buffer.
    pub end_address: usize,
}

impl ControlDump {
    /// Captures the control fields of a buffer.
    #[must_use]
    pub fn capture(geometry: &Geometry, state: &EngineState) -> Self {
        Self {
            block_size: geometry.block_size(),
            block_count: geometry.block_count(),
            current_address: state.current_address(),
            last_marker: state.last_marker,
            start_address: geometry.start_address(),
            end_address: geometry.end_address(),
        }
    }
}

impl fmt::Display for ControlDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "block_size:    {}", self.block_size)?;
        writeln!(f, "block_count:   {}", self.block_count)?;
        writeln!(f, "current_block: {:X}", self.current_address)?;
        writeln!(f, "last_marker:   {}", self.last_marker)?;
        writeln!(f, "start_address: {:X}", self.start_address)?;
        write!(f, "end_address:   {:X}", self.end_address)
    }
}

/// Raw content of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDump {
    /// Base address of the block.
    pub address: usize,
    /// Marker byte.
    pub marker: Marker,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl fmt::Display for BlockDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}: {}-", self.address, self.marker)?;
        for (i, byte) in self.payload.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Reads every block of the buffer, in address order.
///
/// # Errors
///
/// Returns an error if a byte cannot be read.
pub fn dump_blocks<M: Medium + ?Sized>(geometry: &Geometry, medium: &M) -> MediumResult<Vec<BlockDump>> {
    geometry
        .blocks()
        .map(|address| {
            let marker = Marker::from_byte(medium.read(address)?);
            let mut payload = vec![0u8; geometry.payload_size()];
            medium.read_into(address + 1, &mut payload)?;
            Ok(BlockDump {
                address,
                marker,
                payload,
            })
        })
        .collect()
}
