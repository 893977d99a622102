//! Recovery scan: locate the current block after power-up.
//!
//! The scan reads every block marker once and classifies the buffer by the
//! number of non-free markers it finds:
//!
//! | found | meaning                                   | resolution                 |
//! |-------|-------------------------------------------|----------------------------|
//! | 0     | empty buffer                              | none                       |
//! | 1     | the current block                         | none                       |
//! | 2     | put interrupted before freeing old block  | free the older block       |
//! | 2     | pair not adjacent in rotation order       | reformat                   |
//! | > 2   | corruption                                | reformat                   |
//!
//! Of an adjacent pair `A < B`, `B` is newer when it directly follows `A`.
//! When `A` is the first block and `B` the last, rotation has wrapped and
//! `A` is newer. In a two-block buffer both rules apply at once; the
//! generation tag breaks the tie (`A` is newer iff `next(tag B) == tag A`).
//!
//! [`classify`] only reads. [`resolve`] performs the repair writes.

use crate::format;
use crate::geometry::Geometry;
use crate::marker::Marker;
use crate::state::EngineState;
use eewl_medium::{Medium, MediumResult};

/// A block found carrying a non-free marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidBlock {
    /// Base address of the block.
    pub address: usize,
    /// Marker found at the base address.
    pub marker: Marker,
}

/// What the markers on the medium say about the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No block carries a valid marker.
    Empty,
    /// Exactly one block is valid.
    Current {
        /// The valid block.
        block: ValidBlock,
    },
    /// A put was interrupted after marking the new block valid and before
    /// freeing the old one.
    Interrupted {
        /// The block written last; it survives.
        newer: ValidBlock,
        /// The block the interrupted put was replacing.
        older: ValidBlock,
    },
    /// The markers are inconsistent with the write protocol.
    Corrupted,
}

/// Result of [`classify`]: every valid block plus the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Valid blocks in address order.
    pub valid: Vec<ValidBlock>,
    /// What the valid blocks mean.
    pub verdict: Verdict,
}

impl Classification {
    /// Engine state the buffer is left in once [`resolve`] has run.
    #[must_use]
    pub fn settled_state(&self) -> EngineState {
        match self.verdict {
            Verdict::Current { block } | Verdict::Interrupted { newer: block, .. } => {
                EngineState::at(block.address, block.marker)
            }
            Verdict::Empty | Verdict::Corrupted => EngineState::empty(),
        }
    }
}

/// How [`resolve`] settled the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Buffer holds no data.
    Empty,
    /// One valid block found, nothing to repair.
    Current {
        /// Base address of the current block.
        address: usize,
    },
    /// Interrupted put resolved by freeing the older block.
    ResolvedInterruptedWrite {
        /// Block kept as current.
        kept: usize,
        /// Block whose marker was freed.
        freed: usize,
    },
    /// Markers were inconsistent; the buffer was formatted and its data lost.
    Reformatted {
        /// Number of valid markers that were found.
        valid_markers: usize,
    },
}

/// Report of a recovery scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// How the buffer was settled.
    pub outcome: RecoveryOutcome,
    /// Addresses of the blocks found valid before any repair.
    pub valid_blocks: Vec<usize>,
    /// Engine state after the scan.
    pub state: EngineState,
}

impl RecoveryReport {
    /// Returns `true` if the scan had to write to the medium.
    #[must_use]
    pub fn repaired(&self) -> bool {
        matches!(
            self.outcome,
            RecoveryOutcome::ResolvedInterruptedWrite { .. } | RecoveryOutcome::Reformatted { .. }
        )
    }
}

/// Reads every block marker and classifies the buffer without writing.
///
/// # Errors
///
/// Returns an error if a marker cannot be read.
pub fn classify<M: Medium + ?Sized>(geometry: &Geometry, medium: &M) -> MediumResult<Classification> {
    let mut valid = Vec::new();
    for address in geometry.blocks() {
        let marker = Marker::from_byte(medium.read(address)?);
        if !marker.is_free() {
            valid.push(ValidBlock { address, marker });
        }
    }

    let verdict = match valid.as_slice() {
        [] => Verdict::Empty,
        [block] => Verdict::Current { block: *block },
        [a, b] => order_pair(geometry, *a, *b),
        _ => Verdict::Corrupted,
    };

    Ok(Classification { valid, verdict })
}

/// Decides which of two valid blocks (`a` before `b` in address order) is newer.
fn order_pair(geometry: &Geometry, a: ValidBlock, b: ValidBlock) -> Verdict {
    let b_follows_a = a.address + geometry.block_size() == b.address;
    let wrapped = a.address == geometry.start_address() && b.address == geometry.last_block_address();

    match (b_follows_a, wrapped) {
        // Two-block buffer: positions alone cannot tell
        (true, true) if b.marker.next() == a.marker => Verdict::Interrupted { newer: a, older: b },
        (true, _) => Verdict::Interrupted { newer: b, older: a },
        (false, true) => Verdict::Interrupted { newer: a, older: b },
        (false, false) => Verdict::Corrupted,
    }
}

/// Settles the buffer according to `classification`.
///
/// Frees the older block of an interrupted put, or formats the whole buffer
/// when the markers are corrupted. Commits after any repair write.
///
/// # Errors
///
/// Returns an error if a repair write or the commit fails.
pub fn resolve<M: Medium + ?Sized>(
    geometry: &Geometry,
    medium: &mut M,
    classification: &Classification,
) -> MediumResult<RecoveryReport> {
    let valid_blocks: Vec<usize> = classification.valid.iter().map(|b| b.address).collect();

    let (outcome, state) = match classification.verdict {
        Verdict::Empty => (RecoveryOutcome::Empty, EngineState::empty()),
        Verdict::Current { block } => (
            RecoveryOutcome::Current {
                address: block.address,
            },
            EngineState::at(block.address, block.marker),
        ),
        Verdict::Interrupted { newer, older } => {
            medium.update(older.address, Marker::FREE.as_byte())?;
            medium.commit()?;
            tracing::info!(
                kept = newer.address,
                freed = older.address,
                "resolved interrupted write"
            );
            (
                RecoveryOutcome::ResolvedInterruptedWrite {
                    kept: newer.address,
                    freed: older.address,
                },
                EngineState::at(newer.address, newer.marker),
            )
        }
        Verdict::Corrupted => {
            tracing::warn!(
                valid_markers = valid_blocks.len(),
                blocks = ?valid_blocks,
                "inconsistent block markers, reformatting buffer"
            );
            format::fast_format(geometry, medium)?;
            (
                RecoveryOutcome::Reformatted {
                    valid_markers: valid_blocks.len(),
                },
                EngineState::empty(),
            )
        }
    };

    Ok(RecoveryReport {
        outcome,
        valid_blocks,
        state,
    })
}

/// Classifies and resolves in one pass.
///
/// # Errors
///
/// Returns an error if the medium cannot be read or repaired.
pub fn recover<M: Medium + ?Sized>(geometry: &Geometry, medium: &mut M) -> MediumResult<RecoveryReport> {
    let classification = classify(geometry, &*medium)?;
    resolve(geometry, medium, &classification)
}
