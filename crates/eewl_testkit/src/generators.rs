//! Property-based test generators using proptest.
//!
//! Provides strategies for generating buffer layouts, records, operation
//! sequences and raw medium images.

use eewl_core::Config;
use proptest::prelude::*;

/// Strategy for generating records of exactly `payload_size` bytes.
pub fn payload_strategy(payload_size: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), payload_size)
}

/// Strategy for generating valid buffer configurations.
///
/// Covers the single-block and two-block cases as well as larger rings.
pub fn config_strategy() -> impl Strategy<Value = Config> {
    (1usize..=16, 1usize..=12, 1usize..=64).prop_map(|(payload_size, block_count, start)| {
        Config::new(payload_size)
            .block_count(block_count)
            .start_address(start)
    })
}

/// Strategy for generating a configuration together with records that fit it.
pub fn config_with_records_strategy(
    max_records: usize,
) -> impl Strategy<Value = (Config, Vec<Vec<u8>>)> {
    config_strategy().prop_flat_map(move |config| {
        let records = prop::collection::vec(payload_strategy(config.payload_size), 1..=max_records);
        (Just(config), records)
    })
}

/// Operations on a buffer.
#[derive(Debug, Clone)]
pub enum BufferOp {
    /// Store a record.
    Put(Vec<u8>),
    /// Read the record back.
    Get,
    /// Erase the buffer.
    Format,
    /// Drop the buffer and start a new one on the same medium.
    Restart,
}

/// Strategy for generating a single operation.
pub fn buffer_op_strategy(payload_size: usize) -> impl Strategy<Value = BufferOp> {
    prop_oneof![
        6 => payload_strategy(payload_size).prop_map(BufferOp::Put),
        3 => Just(BufferOp::Get),
        1 => Just(BufferOp::Format),
        2 => Just(BufferOp::Restart),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn buffer_ops_strategy(
    payload_size: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<BufferOp>> {
    prop::collection::vec(buffer_op_strategy(payload_size), 1..=max_ops)
}

/// Strategy for generating a configuration with an arbitrary image of its
/// buffer region.
///
/// Marker bytes are biased toward the free value so that images with zero,
/// one and two valid blocks come up as often as corrupted ones.
pub fn image_strategy() -> impl Strategy<Value = (Config, Vec<u8>)> {
    config_strategy().prop_flat_map(|config| {
        let end = config.start_address + config.block_count * (config.payload_size + 1);
        let byte = prop_oneof![3 => Just(0xFFu8), 1 => any::<u8>()];
        (Just(config), prop::collection::vec(byte, end))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn configs_are_valid(config in config_strategy()) {
            prop_assert!(config.geometry().is_ok());
        }

        #[test]
        fn records_match_payload_size((config, records) in config_with_records_strategy(8)) {
            for record in &records {
                prop_assert_eq!(record.len(), config.payload_size);
            }
        }

        #[test]
        fn images_cover_the_buffer((config, image) in image_strategy()) {
            let geometry = config.geometry().unwrap();
            prop_assert_eq!(image.len(), geometry.end_address());
        }
    }
}
