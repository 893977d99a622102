//! Benchmark utilities.

use eewl_core::{Config, WearLevelBuffer};
use eewl_medium::{FileMedium, InMemoryMedium, SharedMedium};
use rand::Rng;
use std::path::Path;

/// Record sizes exercised by the benchmarks.
pub const PAYLOAD_SIZES: [usize; 4] = [1, 4, 16, 64];

/// Generate a random record of the specified size.
pub fn random_record(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a batch of random records.
pub fn generate_records(count: usize, payload_size: usize) -> Vec<Vec<u8>> {
    (0..count).map(|_| random_record(payload_size)).collect()
}

/// Buffer configuration used by the benchmarks.
pub fn bench_config(payload_size: usize, block_count: usize) -> Config {
    Config::new(payload_size)
        .block_count(block_count)
        .start_address(0x10)
}

/// Opens a started buffer on a fresh RAM medium.
pub fn memory_buffer(config: Config) -> (WearLevelBuffer<InMemoryMedium>, SharedMedium<InMemoryMedium>) {
    let medium = SharedMedium::new(InMemoryMedium::empty());
    let buffer = WearLevelBuffer::open(config, medium.clone()).expect("Failed to open buffer");
    (buffer, medium)
}

/// Opens a started buffer on an image file at `path`.
pub fn file_buffer(config: Config, path: &Path) -> WearLevelBuffer<FileMedium> {
    let medium = SharedMedium::new(FileMedium::open(path).expect("Failed to open image"));
    WearLevelBuffer::open(config, medium).expect("Failed to open buffer")
}
