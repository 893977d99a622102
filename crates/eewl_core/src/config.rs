//! Buffer configuration.

use crate::error::CoreResult;
use crate::geometry::Geometry;

/// Configuration for a wear-leveled buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Size in bytes of the stored record.
    pub payload_size: usize,

    /// Number of blocks the record rotates across.
    pub block_count: usize,

    /// Medium address of the first block. Must not be 0.
    pub start_address: usize,

    /// Whether every put commits the medium (safer but slower on media with
    /// an expensive flush).
    pub commit_on_put: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            payload_size: 1,
            block_count: 10,
            start_address: 1,
            commit_on_put: true,
        }
    }
}

impl Config {
    /// Creates a configuration for a record of `payload_size` bytes with
    /// default values otherwise.
    #[must_use]
    pub fn new(payload_size: usize) -> Self {
        Self {
            payload_size,
            ..Self::default()
        }
    }

    /// Sets the number of blocks.
    #[must_use]
    pub const fn block_count(mut self, count: usize) -> Self {
        self.block_count = count;
        self
    }

    /// Sets the address of the first block.
    #[must_use]
    pub const fn start_address(mut self, address: usize) -> Self {
        self.start_address = address;
        self
    }

    /// Sets whether every put commits the medium.
    #[must_use]
    pub const fn commit_on_put(mut self, value: bool) -> Self {
        self.commit_on_put = value;
        self
    }

    /// Validates the configuration and computes the buffer layout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] if the layout is invalid.
    pub fn geometry(&self) -> CoreResult<Geometry> {
        Geometry::new(self.payload_size, self.block_count, self.start_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.block_count, 10);
        assert_eq!(config.start_address, 1);
        assert!(config.commit_on_put);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new(4)
            .block_count(3)
            .start_address(0x10)
            .commit_on_put(false);

        assert_eq!(config.payload_size, 4);
        assert_eq!(config.block_count, 3);
        assert_eq!(config.start_address, 0x10);
        assert!(!config.commit_on_put);
    }

    #[test]
    fn geometry_validation() {
        assert!(Config::new(4).geometry().is_ok());
        assert!(Config::new(4).start_address(0).geometry().is_err());
    }
}
