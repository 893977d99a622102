//! Logical erase of a buffer.

use crate::geometry::Geometry;
use crate::marker::Marker;
use eewl_medium::{Medium, MediumResult};

/// Writes the free sentinel into every block marker and commits.
///
/// Payload bytes are left as they are; with every marker free they are
/// unreachable. Markers that are already free are not rewritten, so a
/// repeated format costs no endurance.
///
/// # Errors
///
/// Returns an error if a marker cannot be written or the commit fails.
pub fn fast_format<M: Medium + ?Sized>(geometry: &Geometry, medium: &mut M) -> MediumResult<()> {
    for address in geometry.blocks() {
        medium.update(address, Marker::FREE.as_byte())?;
    }
    medium.commit()?;

    tracing::debug!(
        start = geometry.start_address(),
        blocks = geometry.block_count(),
        "buffer formatted"
    );
    Ok(())
}
