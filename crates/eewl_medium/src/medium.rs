//! Medium adapter trait definition.

use crate::error::MediumResult;

/// Value of an erased (never written or freed) byte.
pub const ERASED_BYTE: u8 = 0xFF;

/// A byte-addressable non-volatile medium.
///
/// Media are **opaque byte stores**. The wear-leveling engine owns the block
/// layout; a medium only reads and stores single bytes.
///
/// # Invariants
///
/// - `read` returns the byte most recently stored at `address`
/// - each single-byte `write` is independently durable once `commit` returns
/// - a sequence of writes may be cut short at any byte boundary by a power
///   loss; no write is ever half-applied
///
/// # Implementors
///
/// - [`super::InMemoryMedium`] - RAM-backed
/// - [`super::FileMedium`] - medium image file
pub trait Medium: Send {
    /// Reads the byte at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is beyond the medium capacity or an
    /// I/O error occurs.
    fn read(&self, address: usize) -> MediumResult<u8>;

    /// Stores `value` at `address` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is beyond the medium capacity or an
    /// I/O error occurs.
    fn write(&mut self, address: usize, value: u8) -> MediumResult<()>;

    /// Flushes pending stores to the physical medium.
    ///
    /// Media without a separate flush step implement this as a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn commit(&mut self) -> MediumResult<()>;

    /// Performs the one-time medium initialization.
    ///
    /// `size_hint` is the number of bytes the buffers sharing this medium
    /// need. It is called at most once per medium by
    /// [`super::SharedMedium::ensure_initialized`].
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot provide `size_hint` bytes.
    fn init(&mut self, size_hint: usize) -> MediumResult<()>;

    /// Returns the number of addressable bytes.
    fn capacity(&self) -> usize;

    /// Stores `value` at `address` only if the byte currently differs.
    ///
    /// Skipping unchanged bytes spares write endurance.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or the write fails.
    fn update(&mut self, address: usize, value: u8) -> MediumResult<()> {
        if self.read(address)? != value {
            self.write(address, value)?;
        }
        Ok(())
    }

    /// Reads `buf.len()` bytes starting at `address` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if any byte cannot be read.
    fn read_into(&self, address: usize, buf: &mut [u8]) -> MediumResult<()> {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read(address + i)?;
        }
        Ok(())
    }

    /// Updates `data.len()` bytes starting at `address`, lowest address first.
    ///
    /// # Errors
    ///
    /// Returns an error at the first byte that cannot be stored; bytes before
    /// it remain stored.
    fn update_all(&mut self, address: usize, data: &[u8]) -> MediumResult<()> {
        for (i, &byte) in data.iter().enumerate() {
            self.update(address + i, byte)?;
        }
        Ok(())
    }
}

impl<M: Medium + ?Sized> Medium for Box<M> {
    fn read(&self, address: usize) -> MediumResult<u8> {
        (**self).read(address)
    }

    fn write(&mut self, address: usize, value: u8) -> MediumResult<()> {
        (**self).write(address, value)
    }

    fn commit(&mut self) -> MediumResult<()> {
        (**self).commit()
    }

    fn init(&mut self, size_hint: usize) -> MediumResult<()> {
        (**self).init(size_hint)
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn update(&mut self, address: usize, value: u8) -> MediumResult<()> {
        (**self).update(address, value)
    }

    fn read_into(&self, address: usize, buf: &mut [u8]) -> MediumResult<()> {
        (**self).read_into(address, buf)
    }

    fn update_all(&mut self, address: usize, data: &[u8]) -> MediumResult<()> {
        (**self).update_all(address, data)
    }
}
