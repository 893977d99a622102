//! # eewl Core
//!
//! Crash-safe, wear-leveled storage of a single fixed-size record.
//!
//! A buffer rotates one record across a ring of blocks on a
//! [`Medium`](eewl_medium::Medium). Each block is a one-byte marker followed
//! by the payload:
//!
//! ```text
//! start_address
//! v
//! +----+---------+----+---------+-----+----+---------+
//! | M0 | payload | M1 | payload | ... | Mn | payload |
//! +----+---------+----+---------+-----+----+---------+
//! ```
//!
//! A marker of `0xFF` means the block is free. Any other value marks the
//! block holding the current record and doubles as a generation tag. A put
//! writes the payload into the next block, then its marker, then frees the
//! previous marker, so power loss at any point leaves a state that
//! [`WearLevelBuffer::begin`] resolves to either the old or the new record.
//!
//! This crate provides:
//! - [`WearLevelBuffer`], the engine
//! - [`Config`] and [`Geometry`] for the buffer layout
//! - the [`recovery`] scan, usable on its own for read-only verification
//! - [`ControlDump`] and [`BlockDump`] for introspection

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod config;
mod diagnostics;
mod error;
mod format;
mod geometry;
mod marker;
mod read;
pub mod recovery;
mod state;
mod stats;
mod write;

pub use buffer::WearLevelBuffer;
pub use config::Config;
pub use diagnostics::{dump_blocks, BlockDump, ControlDump};
pub use error::{CoreError, CoreResult};
pub use geometry::{Geometry, NO_BLOCK};
pub use marker::Marker;
pub use recovery::{RecoveryOutcome, RecoveryReport};
pub use state::EngineState;
pub use stats::{BufferStats, StatsSnapshot};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
