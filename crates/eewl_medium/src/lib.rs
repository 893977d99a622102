//! # eewl Medium
//!
//! Medium adapter trait and implementations for eewl.
//!
//! A medium is the physical, byte-addressable non-volatile memory that the
//! wear-leveling engine rotates writes across: an EEPROM, an emulated EEPROM
//! in flash, or a RAM-backed harness. Media are **opaque byte stores** - they
//! know nothing about blocks, markers or payloads.
//!
//! ## Design Principles
//!
//! - A single-byte store is durable on its own once committed
//! - Multi-byte stores are never assumed atomic as a group
//! - Medium-wide initialization runs once per physical medium, through
//!   [`SharedMedium`]
//!
//! ## Available Media
//!
//! - [`InMemoryMedium`] - RAM-backed, for tests and simulations
//! - [`FileMedium`] - A medium image file on the host file system
//!
//! ## Example
//!
//! ```rust
//! use eewl_medium::{InMemoryMedium, Medium};
//!
//! let mut medium = InMemoryMedium::new(64);
//! medium.update(0x10, 0xFE).unwrap();
//! assert_eq!(medium.read(0x10).unwrap(), 0xFE);
//! assert_eq!(medium.read(0x11).unwrap(), 0xFF);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod medium;
mod memory;
mod shared;

pub use error::{MediumError, MediumResult};
pub use file::FileMedium;
pub use medium::{Medium, ERASED_BYTE};
pub use memory::InMemoryMedium;
pub use shared::{init_size_hint, SharedMedium, SharedMediumGuard};
