//! Write sequencer: committing a new record into the next block.
//!
//! Store order within a put is the crash-safety contract:
//!
//! 1. payload bytes of the destination block
//! 2. marker of the destination block (the new record becomes current)
//! 3. free marker of the previous block
//! 4. commit
//!
//! Cut short before step 2, the destination marker is still free and the
//! old record stays current. Cut short between steps 2 and 3, two adjacent
//! blocks are valid and the recovery scan keeps the destination.

use crate::geometry::Geometry;
use crate::marker::Marker;
use crate::state::EngineState;
use eewl_medium::{Medium, MediumResult};

/// Writes `payload` into the block after the current one.
///
/// Returns the state the buffer is in once every store has landed. The
/// caller's state is not touched; it is replaced only on success.
///
/// # Errors
///
/// Returns an error if any store or the commit fails. The medium is then in
/// one of the states the recovery scan resolves.
pub fn write_next<M: Medium + ?Sized>(
    geometry: &Geometry,
    medium: &mut M,
    state: &EngineState,
    payload: &[u8],
    commit: bool,
) -> MediumResult<EngineState> {
    debug_assert_eq!(payload.len(), geometry.payload_size());

    let (destination, previous_tag) = match state.current {
        Some(current) => (
            geometry.next_block(current),
            Marker::from_byte(medium.read(current)?),
        ),
        None => (geometry.start_address(), state.last_marker),
    };
    let marker = previous_tag.next();

    if state.current == Some(destination) {
        // Single-block buffer: no spare block to rotate into
        medium.update(destination, Marker::FREE.as_byte())?;
        medium.update_all(destination + 1, payload)?;
        medium.update(destination, marker.as_byte())?;
    } else {
        medium.update_all(destination + 1, payload)?;
        medium.update(destination, marker.as_byte())?;
        if let Some(current) = state.current {
            medium.update(current, Marker::FREE.as_byte())?;
        }
    }

    if commit {
        medium.commit()?;
    }

    tracing::debug!(
        from = state.current_address(),
        to = destination,
        marker = %marker,
        "record written"
    );
    Ok(EngineState::at(destination, marker))
}
