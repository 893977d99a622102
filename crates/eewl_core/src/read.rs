//! Copying the current record out of the medium.

use crate::geometry::Geometry;
use crate::state::EngineState;
use eewl_medium::{Medium, MediumResult};

/// Copies the payload of the current block into `out`.
///
/// Returns `false` and leaves `out` untouched when the buffer holds no data.
/// `out` must be exactly [`Geometry::payload_size`] bytes long.
///
/// # Errors
///
/// Returns an error if a payload byte cannot be read.
pub fn read_current<M: Medium + ?Sized>(
    geometry: &Geometry,
    medium: &M,
    state: &EngineState,
    out: &mut [u8],
) -> MediumResult<bool> {
    debug_assert_eq!(out.len(), geometry.payload_size());

    let Some(address) = state.current else {
        return Ok(false);
    };
    medium.read_into(address + 1, out)?;
    Ok(true)
}
