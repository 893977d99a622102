//! The wear-leveled record buffer.

use crate::config::Config;
use crate::diagnostics::{self, BlockDump, ControlDump};
use crate::error::{CoreError, CoreResult};
use crate::format;
use crate::geometry::Geometry;
use crate::marker::Marker;
use crate::read;
use crate::recovery::{self, RecoveryOutcome, RecoveryReport};
use crate::state::EngineState;
use crate::stats::BufferStats;
use crate::write;
use eewl_medium::{Medium, SharedMedium};

/// A single fixed-size record, wear-leveled across a ring of blocks.
///
/// Each [`put`](Self::put) writes the record into the block after the
/// current one, so writes rotate evenly over all blocks. A put cut short by
/// power loss at any byte leaves either the old or the new record for the
/// next [`begin`](Self::begin) to find, never a mix of both.
///
/// # Lifecycle
///
/// 1. [`new`](Self::new) computes the layout and reserves it on the medium
/// 2. [`begin`](Self::begin) initializes the medium once and runs the
///    recovery scan
/// 3. [`put`](Self::put) / [`get`](Self::get) / [`fast_format`](Self::fast_format)
///
/// A failed put leaves the buffer unstarted; call `begin` again to rescan.
///
/// # Concurrency
///
/// One owner per buffer. Buffers placed on the same physical medium must
/// share one [`SharedMedium`], which serializes their medium accesses.
///
/// # Example
///
/// ```rust
/// use eewl_core::{Config, WearLevelBuffer};
/// use eewl_medium::{InMemoryMedium, SharedMedium};
///
/// let medium = SharedMedium::new(InMemoryMedium::empty());
/// let config = Config::new(4).block_count(10).start_address(0x10);
///
/// let mut buffer = WearLevelBuffer::open(config, medium).unwrap();
/// assert_eq!(buffer.get().unwrap(), None);
///
/// buffer.put(&[1, 2, 3, 4]).unwrap();
/// assert_eq!(buffer.get().unwrap(), Some(vec![1, 2, 3, 4]));
/// ```
pub struct WearLevelBuffer<M> {
    config: Config,
    geometry: Geometry,
    medium: SharedMedium<M>,
    /// `None` until scanned, and again after a failed put.
    state: Option<EngineState>,
    stats: BufferStats,
}

impl<M: Medium> WearLevelBuffer<M> {
    /// Creates a buffer without touching the medium.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid,
    /// in particular if the start address is 0.
    pub fn new(config: Config, medium: SharedMedium<M>) -> CoreResult<Self> {
        let geometry = config.geometry()?;
        medium.reserve(geometry.end_address());

        Ok(Self {
            config,
            geometry,
            medium,
            state: None,
            stats: BufferStats::new(),
        })
    }

    /// Creates a buffer and runs [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the medium cannot
    /// be initialized or the scan fails.
    pub fn open(config: Config, medium: SharedMedium<M>) -> CoreResult<Self> {
        let mut buffer = Self::new(config, medium)?;
        buffer.begin()?;
        Ok(buffer)
    }

    /// Initializes the medium if needed and locates the current block.
    ///
    /// Repairs an interrupted put, or formats the buffer when its markers are
    /// corrupted. Calling it again rescans.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Medium`] if the medium cannot be initialized,
    /// read or repaired.
    pub fn begin(&mut self) -> CoreResult<RecoveryReport> {
        self.state = None;
        self.stats.record_scan();

        let report = {
            let end_address = self.geometry.end_address();
            let result = self.medium.ensure_initialized(end_address).and_then(|()| {
                let mut medium = self.medium.lock();
                recovery::recover(&self.geometry, &mut *medium)
            });
            result.map_err(|e| self.fail(e))?
        };

        match report.outcome {
            RecoveryOutcome::ResolvedInterruptedWrite { .. } => {
                self.stats.record_interrupted_write();
            }
            RecoveryOutcome::Reformatted { .. } => self.stats.record_corruption(),
            RecoveryOutcome::Empty | RecoveryOutcome::Current { .. } => {}
        }

        tracing::debug!(
            start = self.geometry.start_address(),
            blocks = self.geometry.block_count(),
            current = report.state.current_address(),
            outcome = ?report.outcome,
            "buffer started"
        );
        self.state = Some(report.state);
        Ok(report)
    }

    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PayloadSize`] if `payload` is not exactly the
    /// record size, [`CoreError::NotStarted`] before `begin`, and
    /// [`CoreError::Medium`] if a store fails. After a medium error the
    /// buffer must be rescanned with `begin`.
    pub fn put(&mut self, payload: &[u8]) -> CoreResult<()> {
        self.check_payload(payload.len())?;
        let state = self.started()?;

        let result = {
            let mut medium = self.medium.lock();
            write::write_next(
                &self.geometry,
                &mut *medium,
                &state,
                payload,
                self.config.commit_on_put,
            )
        };

        match result {
            Ok(next) => {
                self.state = Some(next);
                self.stats.record_put(payload.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.state = None;
                Err(self.fail(e))
            }
        }
    }

    /// Returns a copy of the current record, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotStarted`] before `begin` and
    /// [`CoreError::Medium`] if the record cannot be read.
    pub fn get(&self) -> CoreResult<Option<Vec<u8>>> {
        let mut out = vec![0u8; self.geometry.payload_size()];
        Ok(self.get_into(&mut out)?.then_some(out))
    }

    /// Copies the current record into `out`.
    ///
    /// Returns `false` and leaves `out` untouched if there is no record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PayloadSize`] if `out` is not exactly the record
    /// size, [`CoreError::NotStarted`] before `begin` and
    /// [`CoreError::Medium`] if the record cannot be read.
    pub fn get_into(&self, out: &mut [u8]) -> CoreResult<bool> {
        self.check_payload(out.len())?;
        let state = self.started()?;

        let found = read::read_current(&self.geometry, &*self.medium.lock(), &state, out)
            .map_err(|e| self.fail(e))?;

        self.stats.record_get(found);
        Ok(found)
    }

    /// Logically erases the buffer: every block marker becomes free.
    ///
    /// Works whether or not the buffer has been started, and leaves it
    /// started and empty.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Medium`] if the medium cannot be initialized or
    /// written.
    pub fn fast_format(&mut self) -> CoreResult<()> {
        let end_address = self.geometry.end_address();
        let result = self.medium.ensure_initialized(end_address).and_then(|()| {
            let mut medium = self.medium.lock();
            format::fast_format(&self.geometry, &mut *medium)
        });
        result.map_err(|e| self.fail(e))?;

        self.stats.record_format();
        self.state = Some(EngineState::empty());
        Ok(())
    }

    /// Flushes pending stores; needed only with `commit_on_put` disabled.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Medium`] if the commit fails.
    pub fn commit(&self) -> CoreResult<()> {
        self.medium.lock().commit().map_err(|e| self.fail(e))
    }

    /// Returns the buffer layout.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the engine state, `None` if the buffer is not started.
    pub fn state(&self) -> Option<EngineState> {
        self.state
    }

    /// Returns whether `begin` has succeeded since the last failure.
    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    /// Returns the address of the block holding the record.
    pub fn current_block_address(&self) -> Option<usize> {
        self.state.and_then(|s| s.current)
    }

    /// Returns the most recent generation tag.
    pub fn last_marker(&self) -> Marker {
        self.state.map_or(Marker::FALLBACK, |s| s.last_marker)
    }

    /// Returns the buffer statistics.
    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Returns the shared medium handle.
    pub fn medium(&self) -> &SharedMedium<M> {
        &self.medium
    }

    /// Captures geometry and engine state fields.
    pub fn dump_control(&self) -> ControlDump {
        ControlDump::capture(&self.geometry, &self.state.unwrap_or_default())
    }

    /// Reads the raw content of every block.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Medium`] if a byte cannot be read.
    pub fn dump_blocks(&self) -> CoreResult<Vec<BlockDump>> {
        let medium = self.medium.lock();
        Ok(diagnostics::dump_blocks(&self.geometry, &*medium)?)
    }

    fn started(&self) -> CoreResult<EngineState> {
        self.state.ok_or(CoreError::NotStarted)
    }

    fn check_payload(&self, len: usize) -> CoreResult<()> {
        let expected = self.geometry.payload_size();
        if len != expected {
            return Err(CoreError::payload_size(expected, len));
        }
        Ok(())
    }

    fn fail(&self, error: eewl_medium::MediumError) -> CoreError {
        self.stats.record_error();
        CoreError::from(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eewl_medium::{FileMedium, InMemoryMedium, MediumError};
    use proptest::prelude::*;

    fn config() -> Config {
        Config::new(4).block_count(10).start_address(0x10)
    }

    fn open_memory() -> (WearLevelBuffer<InMemoryMedium>, SharedMedium<InMemoryMedium>) {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let buffer = WearLevelBuffer::open(config(), medium.clone()).unwrap();
        (buffer, medium)
    }

    #[test]
    fn zero_start_address_is_rejected() {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let result = WearLevelBuffer::new(config().start_address(0), medium);
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn operations_before_begin_fail() {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let mut buffer = WearLevelBuffer::new(config(), medium).unwrap();

        assert!(matches!(buffer.get(), Err(CoreError::NotStarted)));
        assert!(matches!(buffer.put(&[0; 4]), Err(CoreError::NotStarted)));
        assert!(!buffer.is_started());
    }

    #[test]
    fn fresh_buffer_is_empty() {
        let (buffer, _) = open_memory();
        assert_eq!(buffer.get().unwrap(), None);
        assert_eq!(buffer.current_block_address(), None);
        assert_eq!(buffer.dump_control().current_address, 0);
    }

    #[test]
    fn put_then_get() {
        let (mut buffer, _) = open_memory();
        buffer.put(&[1, 2, 3, 4]).unwrap();
        assert_eq!(buffer.get().unwrap(), Some(vec![1, 2, 3, 4]));

        buffer.put(&[5, 6, 7, 8]).unwrap();
        assert_eq!(buffer.get().unwrap(), Some(vec![5, 6, 7, 8]));
    }

    #[test]
    fn get_into_leaves_output_untouched_when_empty() {
        let (buffer, _) = open_memory();
        let mut out = [9u8; 4];
        assert!(!buffer.get_into(&mut out).unwrap());
        assert_eq!(out, [9; 4]);
    }

    #[test]
    fn wrong_payload_size_is_rejected() {
        let (mut buffer, _) = open_memory();
        assert!(matches!(
            buffer.put(&[1, 2, 3]),
            Err(CoreError::PayloadSize {
                expected: 4,
                actual: 3
            })
        ));
        let mut out = [0u8; 5];
        assert!(buffer.get_into(&mut out).is_err());
    }

    #[test]
    fn record_survives_restart() {
        let (mut buffer, medium) = open_memory();
        buffer.put(&[7, 7, 7, 7]).unwrap();
        buffer.put(&[8, 8, 8, 8]).unwrap();
        drop(buffer);

        let reopened = WearLevelBuffer::open(config(), medium).unwrap();
        assert_eq!(reopened.get().unwrap(), Some(vec![8, 8, 8, 8]));
        assert_eq!(reopened.current_block_address(), Some(0x15));
        assert_eq!(reopened.last_marker().as_byte(), 0xFB);
    }

    #[test]
    fn writes_rotate_across_every_block() {
        let (mut buffer, medium) = open_memory();
        let geometry = *buffer.geometry();
        let mut visited = Vec::new();

        for i in 0..25u8 {
            buffer.put(&[i, 0, 0, 0]).unwrap();
            visited.push(buffer.current_block_address().unwrap());
        }

        let expected: Vec<usize> = geometry.blocks().cycle().take(25).collect();
        assert_eq!(visited, expected);

        let guard = medium.lock();
        for address in geometry.blocks() {
            // Every block was marked valid and freed at least twice
            assert!(guard.write_count(address) >= 4);
        }
    }

    #[test]
    fn format_empties_buffer_and_is_idempotent() {
        let (mut buffer, medium) = open_memory();
        buffer.put(&[1, 1, 1, 1]).unwrap();

        buffer.fast_format().unwrap();
        let once = medium.lock().data();
        assert_eq!(buffer.get().unwrap(), None);

        buffer.fast_format().unwrap();
        assert_eq!(medium.lock().data(), once);
        assert_eq!(buffer.get().unwrap(), None);
        assert_eq!(buffer.stats().formats(), 2);
    }

    #[test]
    fn format_before_begin_starts_empty() {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let mut buffer = WearLevelBuffer::new(config(), medium).unwrap();
        buffer.fast_format().unwrap();

        assert!(buffer.is_started());
        assert_eq!(buffer.get().unwrap(), None);
    }

    #[test]
    fn interrupted_put_after_marker_keeps_new_record() {
        let (mut buffer, medium) = open_memory();
        buffer.put(&[1, 0, 0, 0]).unwrap();
        drop(buffer);

        // Second put cut short after marking block 1 valid
        medium.with(|m| {
            m.update_all(0x16, &[2, 0, 0, 0]).unwrap();
            m.update(0x15, 0xFB).unwrap();
        });

        let mut buffer = WearLevelBuffer::new(config(), medium.clone()).unwrap();
        let report = buffer.begin().unwrap();

        assert_eq!(
            report.outcome,
            RecoveryOutcome::ResolvedInterruptedWrite {
                kept: 0x15,
                freed: 0x10
            }
        );
        assert_eq!(buffer.get().unwrap(), Some(vec![2, 0, 0, 0]));
        assert_eq!(medium.lock().read(0x10).unwrap(), 0xFF);
        assert_eq!(buffer.stats().snapshot().interrupted_writes, 1);
    }

    #[test]
    fn interrupted_put_before_marker_keeps_old_record() {
        let (mut buffer, medium) = open_memory();
        buffer.put(&[1, 0, 0, 0]).unwrap();
        drop(buffer);

        // Payload stored, marker still free
        medium.with(|m| m.update_all(0x16, &[2, 0, 0, 0]).unwrap());

        let buffer = WearLevelBuffer::open(config(), medium).unwrap();
        assert_eq!(buffer.get().unwrap(), Some(vec![1, 0, 0, 0]));
    }

    #[test]
    fn corrupted_markers_are_reformatted() {
        let (mut buffer, medium) = open_memory();
        buffer.put(&[1, 0, 0, 0]).unwrap();

        medium.with(|m| {
            m.write(0x1A, 0x00).unwrap();
            m.write(0x24, 0x00).unwrap();
        });

        let report = buffer.begin().unwrap();
        assert_eq!(report.outcome, RecoveryOutcome::Reformatted { valid_markers: 3 });
        assert_eq!(buffer.get().unwrap(), None);
        assert_eq!(buffer.stats().corruption_reformats(), 1);
    }

    #[test]
    fn buffers_share_one_medium() {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let mut first = WearLevelBuffer::new(config(), medium.clone()).unwrap();
        let mut second =
            WearLevelBuffer::new(Config::new(2).block_count(4).start_address(0x100), medium.clone())
                .unwrap();

        first.begin().unwrap();
        second.begin().unwrap();
        first.put(&[1, 2, 3, 4]).unwrap();
        second.put(&[5, 6]).unwrap();

        assert_eq!(first.get().unwrap(), Some(vec![1, 2, 3, 4]));
        assert_eq!(second.get().unwrap(), Some(vec![5, 6]));
        assert_eq!(medium.lock().capacity(), 0x200);
    }

    #[test]
    fn late_buffer_fits_large_medium() {
        let medium = SharedMedium::new(InMemoryMedium::new(0x1000));
        let mut first = WearLevelBuffer::open(config(), medium.clone()).unwrap();
        first.put(&[1, 2, 3, 4]).unwrap();

        let mut second =
            WearLevelBuffer::new(config().start_address(0x300), medium.clone()).unwrap();
        second.begin().unwrap();
        second.put(&[5, 6, 7, 8]).unwrap();

        first.begin().unwrap();
        assert_eq!(first.get().unwrap(), Some(vec![1, 2, 3, 4]));
        assert_eq!(second.get().unwrap(), Some(vec![5, 6, 7, 8]));
    }

    #[test]
    fn buffer_past_medium_end_fails_alone() {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let mut first = WearLevelBuffer::open(config(), medium.clone()).unwrap();
        first.put(&[1, 2, 3, 4]).unwrap();

        let mut late =
            WearLevelBuffer::new(config().start_address(0x300), medium.clone()).unwrap();
        assert!(matches!(
            late.begin(),
            Err(CoreError::Medium(MediumError::BeyondInitialized {
                requested: 0x332,
                initialized: 0x100
            }))
        ));

        first.begin().unwrap();
        assert_eq!(first.get().unwrap(), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn layout_at_address_space_end_fails_without_panic() {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let config = Config::new(1).block_count(2).start_address(usize::MAX - 100);
        let mut buffer = WearLevelBuffer::new(config, medium).unwrap();

        assert!(matches!(
            buffer.begin(),
            Err(CoreError::Medium(MediumError::SizeOverflow { .. }))
        ));
        assert!(!buffer.is_started());
    }

    #[test]
    fn medium_init_failure_is_surfaced() {
        let medium = SharedMedium::new(InMemoryMedium::failing_init());
        let mut buffer = WearLevelBuffer::new(config(), medium).unwrap();

        let result = buffer.begin();
        assert!(matches!(
            result,
            Err(CoreError::Medium(MediumError::InitFailed(_)))
        ));
        assert!(!buffer.is_started());
        assert_eq!(buffer.stats().snapshot().errors, 1);
    }

    #[test]
    fn deferred_commit() {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let mut buffer =
            WearLevelBuffer::open(config().commit_on_put(false), medium.clone()).unwrap();

        buffer.put(&[1; 4]).unwrap();
        let before = medium.lock().commit_count();
        buffer.commit().unwrap();
        assert_eq!(medium.lock().commit_count(), before + 1);
    }

    #[test]
    fn record_survives_reopening_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.img");

        {
            let medium = SharedMedium::new(FileMedium::open(&path).unwrap());
            let mut buffer = WearLevelBuffer::open(config(), medium).unwrap();
            buffer.put(&[4, 3, 2, 1]).unwrap();
        }

        let medium = SharedMedium::new(FileMedium::open(&path).unwrap());
        let buffer = WearLevelBuffer::open(config(), medium).unwrap();
        assert_eq!(buffer.get().unwrap(), Some(vec![4, 3, 2, 1]));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0x100);
    }

    #[test]
    fn dump_blocks_shows_current_record() {
        let (mut buffer, _) = open_memory();
        buffer.put(&[0xAB, 0, 0, 0]).unwrap();

        let rows = buffer.dump_blocks().unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].to_string(), "10: FD-AB 00 00 00");
        assert!(rows[1..].iter().all(|r| r.marker.is_free()));
    }

    proptest! {
        #[test]
        fn last_put_wins(records in prop::collection::vec(prop::array::uniform4(any::<u8>()), 1..40)) {
            let (mut buffer, medium) = open_memory();
            for record in &records {
                buffer.put(record).unwrap();
            }
            let last = records.last().unwrap().to_vec();
            prop_assert_eq!(buffer.get().unwrap(), Some(last.clone()));

            let reopened = WearLevelBuffer::open(config(), medium.clone()).unwrap();
            prop_assert_eq!(reopened.get().unwrap(), Some(last));

            let valid = recovery::classify(buffer.geometry(), &*medium.lock()).unwrap().valid;
            prop_assert_eq!(valid.len(), 1);
        }
    }
}
