//! Test fixtures and buffer helpers.
//!
//! Provides convenience functions for setting up test buffers
//! and common medium images.

use eewl_core::{Config, WearLevelBuffer};
use eewl_medium::{FileMedium, InMemoryMedium, Medium, SharedMedium};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Configuration used by fixtures when none is given: 10 blocks of a
/// 4-byte record starting at `0x10`.
pub fn default_config() -> Config {
    Config::new(4).block_count(10).start_address(0x10)
}

/// A started test buffer with its medium, cleaned up on drop.
pub struct TestBuffer<M> {
    /// The buffer instance.
    pub buffer: WearLevelBuffer<M>,
    /// Handle to the medium under the buffer.
    pub medium: SharedMedium<M>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestBuffer<InMemoryMedium> {
    /// Creates a buffer on a fresh RAM medium.
    pub fn memory(config: Config) -> Self {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let buffer = WearLevelBuffer::open(config, medium.clone())
            .expect("Failed to open in-memory buffer");
        Self {
            buffer,
            medium,
            _temp_dir: None,
        }
    }

    /// Creates a buffer on a RAM medium holding `image`.
    pub fn from_image(config: Config, image: Vec<u8>) -> Self {
        let medium = SharedMedium::new(InMemoryMedium::with_data(image));
        let buffer =
            WearLevelBuffer::open(config, medium.clone()).expect("Failed to open buffer on image");
        Self {
            buffer,
            medium,
            _temp_dir: None,
        }
    }

    /// Returns a copy of the whole medium.
    pub fn image(&self) -> Vec<u8> {
        self.medium.lock().data()
    }
}

impl TestBuffer<FileMedium> {
    /// Creates a buffer on a fresh medium image file.
    pub fn file(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("medium.img");
        let medium = SharedMedium::new(
            FileMedium::open_with_create_dirs(&path).expect("Failed to create medium image"),
        );
        let buffer =
            WearLevelBuffer::open(config, medium.clone()).expect("Failed to open file buffer");
        Self {
            buffer,
            medium,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the path of the medium image file.
    pub fn path(&self) -> PathBuf {
        self.medium.lock().path().to_path_buf()
    }
}

impl<M: Medium> TestBuffer<M> {
    /// Drops the buffer and starts a new one on the same medium, as after a
    /// power cycle.
    pub fn restart(&mut self) {
        let config = self.buffer.config().clone();
        self.buffer =
            WearLevelBuffer::open(config, self.medium.clone()).expect("Failed to restart buffer");
    }
}

impl<M> std::ops::Deref for TestBuffer<M> {
    type Target = WearLevelBuffer<M>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<M> std::ops::DerefMut for TestBuffer<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

/// Runs a test with a started buffer on a RAM medium.
///
/// # Example
///
/// ```rust
/// use eewl_testkit::{default_config, with_memory_buffer};
///
/// with_memory_buffer(default_config(), |buffer| {
///     buffer.put(&[1, 2, 3, 4]).unwrap();
///     assert_eq!(buffer.get().unwrap(), Some(vec![1, 2, 3, 4]));
/// });
/// ```
pub fn with_memory_buffer<F, R>(config: Config, f: F) -> R
where
    F: FnOnce(&mut WearLevelBuffer<InMemoryMedium>) -> R,
{
    let mut test_buffer = TestBuffer::memory(config);
    f(&mut test_buffer.buffer)
}

/// Runs a test with a started buffer on a temporary image file.
pub fn with_file_buffer<F, R>(config: Config, f: F) -> R
where
    F: FnOnce(&mut WearLevelBuffer<FileMedium>, &Path) -> R,
{
    let mut test_buffer = TestBuffer::file(config);
    let path = test_buffer.path();
    f(&mut test_buffer.buffer, &path)
}

/// Medium images for recovery scenarios.
pub mod scenarios {
    use super::*;
    use eewl_core::Marker;

    /// Creates a buffer that has stored `records` in order.
    pub fn written_buffer(config: Config, records: &[Vec<u8>]) -> TestBuffer<InMemoryMedium> {
        let mut test_buffer = TestBuffer::memory(config);
        for record in records {
            test_buffer.put(record).expect("Failed to put record");
        }
        test_buffer
    }

    /// Creates an erased image covering `config`'s buffer.
    pub fn erased_image(config: &Config) -> Vec<u8> {
        let end = config.geometry().expect("Invalid config").end_address();
        vec![Marker::FREE.as_byte(); end]
    }

    /// Creates an image where `older` and `newer` blocks both carry valid
    /// markers, as left by a put interrupted before freeing the old block.
    ///
    /// Block indices are positions in the ring; `newer` normally follows
    /// `older`.
    pub fn interrupted_image(
        config: &Config,
        older: (usize, &[u8]),
        newer: (usize, &[u8]),
    ) -> Vec<u8> {
        let geometry = config.geometry().expect("Invalid config");
        let mut image = erased_image(config);

        let older_tag = Marker::FALLBACK.next();
        for ((index, payload), tag) in [(older, older_tag), (newer, older_tag.next())] {
            let address = geometry.block_address(index).expect("Block index out of range");
            image[address] = tag.as_byte();
            image[address + 1..address + 1 + payload.len()].copy_from_slice(payload);
        }
        image
    }

    /// Creates an image whose markers at `blocks` are all valid.
    pub fn corrupted_image(config: &Config, blocks: &[usize]) -> Vec<u8> {
        let geometry = config.geometry().expect("Invalid config");
        let mut image = erased_image(config);
        for &index in blocks {
            let address = geometry.block_address(index).expect("Block index out of range");
            image[address] = 0x00;
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::scenarios::*;
    use super::*;
    use eewl_core::RecoveryOutcome;

    #[test]
    fn memory_fixture_starts_empty() {
        with_memory_buffer(default_config(), |buffer| {
            assert!(buffer.is_started());
            assert_eq!(buffer.get().unwrap(), None);
        });
    }

    #[test]
    fn file_fixture_persists_across_restart() {
        let mut test_buffer = TestBuffer::file(default_config());
        test_buffer.put(&[1, 2, 3, 4]).unwrap();
        test_buffer.restart();

        assert_eq!(test_buffer.get().unwrap(), Some(vec![1, 2, 3, 4]));
        assert!(test_buffer.path().exists());
    }

    #[test]
    fn with_file_buffer_exposes_image_path() {
        with_file_buffer(default_config(), |buffer, path| {
            buffer.put(&[9; 4]).unwrap();
            let image = std::fs::read(path).unwrap();
            assert_eq!(image[0x10], 0xFD);
            assert_eq!(&image[0x11..0x15], &[9; 4]);
        });
    }

    #[test]
    fn interrupted_image_resolves_to_newer() {
        let config = default_config();
        let image = interrupted_image(&config, (3, &[1; 4]), (4, &[2; 4]));
        let mut test_buffer = TestBuffer::from_image(config, image);

        assert_eq!(test_buffer.get().unwrap(), Some(vec![2; 4]));
        let report = test_buffer.begin().unwrap();
        assert_eq!(report.outcome, RecoveryOutcome::Current { address: 0x24 });
    }

    #[test]
    fn corrupted_image_is_reformatted() {
        let config = default_config();
        let image = corrupted_image(&config, &[0, 4, 7]);
        let test_buffer = TestBuffer::from_image(config, image);

        assert_eq!(test_buffer.get().unwrap(), None);
        assert_eq!(test_buffer.stats().corruption_reformats(), 1);
    }

    #[test]
    fn written_buffer_holds_last_record() {
        let records: Vec<Vec<u8>> = (0..13u8).map(|i| vec![i; 4]).collect();
        let test_buffer = written_buffer(default_config(), &records);
        assert_eq!(test_buffer.get().unwrap(), Some(vec![12; 4]));
        assert_eq!(test_buffer.current_block_address(), Some(0x1A));
    }
}
