//! File-backed medium: a medium image on the host file system.

use crate::error::{MediumError, MediumResult};
use crate::medium::{Medium, ERASED_BYTE};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A medium image file.
///
/// Emulates a byte-addressable EEPROM on the host: address `n` is byte `n`
/// of the file. A new image has no capacity until `init` grows it, filling
/// the new bytes with the erased value `0xFF`.
///
/// # Durability
///
/// - `write` stores through the OS page cache
/// - `commit` calls `File::sync_data()`
///
/// # Ownership
///
/// The image file is locked exclusively while the medium is open; a second
/// open of the same image fails with [`MediumError::Locked`].
///
/// # Example
///
/// ```no_run
/// use eewl_medium::{FileMedium, Medium};
/// use std::path::Path;
///
/// let mut medium = FileMedium::open(Path::new("eeprom.bin")).unwrap();
/// medium.init(512).unwrap();
/// medium.update(0x10, 0xFE).unwrap();
/// medium.commit().unwrap();
/// ```
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    file: Mutex<File>,
    size: usize,
}

impl FileMedium {
    /// Opens or creates a medium image at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is locked by another
    /// process.
    pub fn open(path: &Path) -> MediumResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(MediumError::Locked);
        }

        let size = usize::try_from(file.metadata()?.len())
            .map_err(|_| MediumError::init_failed("medium image too large"))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size,
        })
    }

    /// Opens or creates a medium image, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> MediumResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the image file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check(&self, address: usize) -> MediumResult<()> {
        if address >= self.size {
            return Err(MediumError::OutOfRange {
                address,
                capacity: self.size,
            });
        }
        Ok(())
    }
}

impl Medium for FileMedium {
    fn read(&self, address: usize) -> MediumResult<u8> {
        self.check(address)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(address as u64))?;

        let mut byte = [0u8; 1];
        file.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write(&mut self, address: usize, value: u8) -> MediumResult<()> {
        self.check(address)?;

        let file = self.file.get_mut();
        file.seek(SeekFrom::Start(address as u64))?;
        file.write_all(&[value])?;
        Ok(())
    }

    fn commit(&mut self) -> MediumResult<()> {
        self.file.get_mut().sync_data()?;
        Ok(())
    }

    fn init(&mut self, size_hint: usize) -> MediumResult<()> {
        if size_hint <= self.size {
            return Ok(());
        }

        let file = self.file.get_mut();
        file.seek(SeekFrom::Start(self.size as u64))?;
        file.write_all(&vec![ERASED_BYTE; size_hint - self.size])?;
        file.sync_all()?;

        tracing::debug!(path = %self.path.display(), from = self.size, to = size_hint, "grew medium image");
        self.size = size_hint;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.size
    }

    fn read_into(&self, address: usize, buf: &mut [u8]) -> MediumResult<()> {
        if buf.is_empty() {
            return Ok(());
        }
        self.check(address + buf.len() - 1)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(address as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_new_image_has_no_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        let medium = FileMedium::open(&path).unwrap();
        assert_eq!(medium.capacity(), 0);
        assert!(matches!(
            medium.read(0),
            Err(MediumError::OutOfRange { .. })
        ));
    }

    #[test]
    fn file_init_fills_erased_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        let mut medium = FileMedium::open(&path).unwrap();
        medium.init(256).unwrap();

        assert_eq!(medium.capacity(), 256);
        let mut buf = [0u8; 256];
        medium.read_into(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn file_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        let mut medium = FileMedium::open(&path).unwrap();
        medium.init(32).unwrap();
        medium.write(0x10, 0xFE).unwrap();
        medium.update_all(0x11, &[1, 2, 3, 4]).unwrap();

        assert_eq!(medium.read(0x10).unwrap(), 0xFE);
        let mut buf = [0u8; 4];
        medium.read_into(0x11, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        {
            let mut medium = FileMedium::open(&path).unwrap();
            medium.init(64).unwrap();
            medium.write(5, 0x42).unwrap();
            medium.commit().unwrap();
        }

        {
            let medium = FileMedium::open(&path).unwrap();
            assert_eq!(medium.capacity(), 64);
            assert_eq!(medium.read(5).unwrap(), 0x42);
        }
    }

    #[test]
    fn file_init_keeps_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        let mut medium = FileMedium::open(&path).unwrap();
        medium.init(16).unwrap();
        medium.write(3, 7).unwrap();
        medium.init(8).unwrap();
        medium.init(32).unwrap();

        assert_eq!(medium.capacity(), 32);
        assert_eq!(medium.read(3).unwrap(), 7);
        assert_eq!(medium.read(31).unwrap(), ERASED_BYTE);
    }

    #[test]
    fn file_write_out_of_range_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        let mut medium = FileMedium::open(&path).unwrap();
        medium.init(4).unwrap();
        assert!(matches!(
            medium.write(4, 0),
            Err(MediumError::OutOfRange { .. })
        ));
    }

    #[test]
    fn file_second_open_is_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        let _first = FileMedium::open(&path).unwrap();
        let second = FileMedium::open(&path);
        assert!(matches!(second, Err(MediumError::Locked)));
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("eeprom.bin");

        let medium = FileMedium::open_with_create_dirs(&path).unwrap();
        assert_eq!(medium.path(), path);
        assert!(path.exists());
    }
}
