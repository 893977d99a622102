//! # eewl Testkit
//!
//! Test utilities for eewl.
//!
//! This crate provides:
//! - A power-loss simulating medium and crash recovery harness
//! - Test fixtures and buffer helpers
//! - Property-based test generators using proptest
//! - Golden layouts for format verification
//! - Fuzz testing harnesses
//! - Wear stress utilities
//!
//! ## Usage
//!
//! ```rust
//! use eewl_testkit::prelude::*;
//!
//! with_memory_buffer(default_config(), |buffer| {
//!     buffer.put(&[1, 2, 3, 4]).unwrap();
//!     assert_eq!(buffer.get().unwrap(), Some(vec![1, 2, 3, 4]));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod golden;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use crash::*;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use golden::*;
pub use stress::*;
