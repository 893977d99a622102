//! RAM-backed medium for tests and simulations.

use crate::error::{MediumError, MediumResult};
use crate::medium::{Medium, ERASED_BYTE};

/// A RAM-backed medium.
///
/// Behaves like a freshly erased EEPROM: every byte reads `0xFF` until it is
/// written. Each address keeps a store counter so tests can observe how
/// writes are distributed across the medium.
///
/// A medium created with [`InMemoryMedium::empty`] has no capacity until
/// `init` is called, mirroring parts that must be sized before use.
///
/// # Example
///
/// ```rust
/// use eewl_medium::{InMemoryMedium, Medium};
///
/// let mut medium = InMemoryMedium::new(16);
/// medium.write(3, 0x42).unwrap();
/// medium.update(3, 0x42).unwrap(); // unchanged, not stored again
/// assert_eq!(medium.write_count(3), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryMedium {
    data: Vec<u8>,
    writes: Vec<u64>,
    commits: u64,
    fail_init: bool,
}

impl InMemoryMedium {
    /// Creates an erased medium of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![ERASED_BYTE; capacity],
            writes: vec![0; capacity],
            commits: 0,
            fail_init: false,
        }
    }

    /// Creates a medium with no capacity; `init` sizes it.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a medium holding a pre-existing image.
    ///
    /// Useful for testing recovery scenarios.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        let writes = vec![0; data.len()];
        Self {
            data,
            writes,
            commits: 0,
            fail_init: false,
        }
    }

    /// Creates a medium whose one-time initialization always fails.
    #[must_use]
    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Returns a copy of the whole image.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Returns how many times `address` has been stored to.
    #[must_use]
    pub fn write_count(&self, address: usize) -> u64 {
        self.writes.get(address).copied().unwrap_or(0)
    }

    /// Returns the store counters of every address.
    #[must_use]
    pub fn wear(&self) -> &[u64] {
        &self.writes
    }

    /// Returns how many times `commit` has been called.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Erases the whole image back to `0xFF` without counting wear.
    pub fn erase(&mut self) {
        self.data.fill(ERASED_BYTE);
    }

    fn check(&self, address: usize) -> MediumResult<()> {
        if address >= self.data.len() {
            return Err(MediumError::OutOfRange {
                address,
                capacity: self.data.len(),
            });
        }
        Ok(())
    }
}

impl Medium for InMemoryMedium {
    fn read(&self, address: usize) -> MediumResult<u8> {
        self.check(address)?;
        Ok(self.data[address])
    }

    fn write(&mut self, address: usize, value: u8) -> MediumResult<()> {
        self.check(address)?;
        self.data[address] = value;
        self.writes[address] += 1;
        Ok(())
    }

    fn commit(&mut self) -> MediumResult<()> {
        // RAM has no pending stores
        self.commits += 1;
        Ok(())
    }

    fn init(&mut self, size_hint: usize) -> MediumResult<()> {
        if self.fail_init {
            return Err(MediumError::init_failed("simulated initialization failure"));
        }
        if size_hint > self.data.len() {
            self.data.resize(size_hint, ERASED_BYTE);
            self.writes.resize(size_hint, 0);
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_erased() {
        let medium = InMemoryMedium::new(8);
        assert_eq!(medium.capacity(), 8);
        assert!(medium.data().iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn memory_write_then_read() {
        let mut medium = InMemoryMedium::new(8);
        medium.write(2, 0x10).unwrap();
        assert_eq!(medium.read(2).unwrap(), 0x10);
        assert_eq!(medium.write_count(2), 1);
    }

    #[test]
    fn memory_read_out_of_range_fails() {
        let medium = InMemoryMedium::new(4);
        let result = medium.read(4);
        assert!(matches!(
            result,
            Err(MediumError::OutOfRange {
                address: 4,
                capacity: 4
            })
        ));
    }

    #[test]
    fn memory_write_out_of_range_fails() {
        let mut medium = InMemoryMedium::new(4);
        assert!(medium.write(10, 0).is_err());
    }

    #[test]
    fn memory_update_skips_unchanged_bytes() {
        let mut medium = InMemoryMedium::new(4);
        medium.update(1, 0xFF).unwrap();
        assert_eq!(medium.write_count(1), 0);

        medium.update(1, 0x01).unwrap();
        medium.update(1, 0x01).unwrap();
        assert_eq!(medium.write_count(1), 1);
    }

    #[test]
    fn memory_update_all_and_read_into() {
        let mut medium = InMemoryMedium::new(8);
        medium.update_all(3, &[1, 2, 3]).unwrap();

        let mut buf = [0u8; 3];
        medium.read_into(3, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn memory_empty_grows_on_init() {
        let mut medium = InMemoryMedium::empty();
        assert_eq!(medium.capacity(), 0);

        medium.init(256).unwrap();
        assert_eq!(medium.capacity(), 256);
        assert_eq!(medium.read(255).unwrap(), ERASED_BYTE);
    }

    #[test]
    fn memory_init_never_shrinks() {
        let mut medium = InMemoryMedium::new(512);
        medium.init(256).unwrap();
        assert_eq!(medium.capacity(), 512);
    }

    #[test]
    fn memory_failing_init() {
        let mut medium = InMemoryMedium::failing_init();
        assert!(matches!(medium.init(16), Err(MediumError::InitFailed(_))));
    }

    #[test]
    fn memory_with_data() {
        let medium = InMemoryMedium::with_data(vec![0xFE, 0x01]);
        assert_eq!(medium.read(0).unwrap(), 0xFE);
        assert_eq!(medium.write_count(0), 0);
    }

    #[test]
    fn memory_commit_counts() {
        let mut medium = InMemoryMedium::new(1);
        medium.commit().unwrap();
        medium.commit().unwrap();
        assert_eq!(medium.commit_count(), 2);
    }

    #[test]
    fn memory_erase_restores_free_bytes() {
        let mut medium = InMemoryMedium::new(4);
        medium.write(0, 0).unwrap();
        medium.erase();
        assert_eq!(medium.read(0).unwrap(), ERASED_BYTE);
        assert_eq!(medium.write_count(0), 1);
    }

    #[test]
    fn boxed_medium_delegates() {
        let mut medium: Box<dyn Medium> = Box::new(InMemoryMedium::new(4));
        medium.update_all(0, &[9, 8]).unwrap();
        assert_eq!(medium.read(1).unwrap(), 8);
        assert_eq!(medium.capacity(), 4);
    }

    proptest::proptest! {
        #[test]
        fn update_stores_only_changed_bytes(
            before in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..64),
            after_seed in proptest::collection::vec(proptest::prelude::any::<u8>(), 64),
        ) {
            let after = &after_seed[..before.len()];
            let mut medium = InMemoryMedium::with_data(before.clone());
            medium.update_all(0, after).unwrap();

            for (i, (&old, &new)) in before.iter().zip(after).enumerate() {
                proptest::prop_assert_eq!(medium.read(i).unwrap(), new);
                proptest::prop_assert_eq!(medium.write_count(i), u64::from(old != new));
            }
        }
    }
}
