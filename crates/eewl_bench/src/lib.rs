//! Shared helpers for the eewl benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
