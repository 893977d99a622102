//! Power-loss testing for eewl.
//!
//! This module simulates losing power part way through a put and verifies
//! that the next `begin` finds either the old or the new record.
//!
//! ## Test Strategy
//!
//! A put on a rotating buffer performs, in order:
//!
//! 1. **Payload stores** - one per changed payload byte
//! 2. **Marker store** - the new block becomes current
//! 3. **Free store** - the old block's marker is erased
//! 4. **Commit**
//!
//! [`CrashableMedium`] lets a fixed number of byte stores land and then
//! fails every later store, like a part losing power. The harness restarts
//! on the same image and checks what survived.
//!
//! ## Usage
//!
//! ```rust
//! use eewl_core::Config;
//! use eewl_testkit::crash::{CrashPoint, CrashRecoveryHarness};
//!
//! let mut harness = CrashRecoveryHarness::new(Config::new(4).block_count(10).start_address(0x10));
//! let result = harness.run_point(CrashPoint::BeforeFree);
//! assert!(result.passed, "{:?}", result.error);
//! ```

use eewl_core::{recovery, Config, CoreResult, WearLevelBuffer};
use eewl_medium::{InMemoryMedium, Medium, MediumError, MediumResult, SharedMedium};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Points at which power can be lost during a put on a rotating buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Before any byte of the put is stored.
    BeforePayload,
    /// Half way through the payload stores.
    DuringPayload,
    /// Payload stored, new marker not yet stored.
    BeforeMarker,
    /// New marker stored, old marker not yet freed.
    BeforeFree,
    /// Every store landed, the commit fails.
    BeforeCommit,
}

impl CrashPoint {
    /// Every crash point, in put order.
    pub const ALL: [CrashPoint; 5] = [
        CrashPoint::BeforePayload,
        CrashPoint::DuringPayload,
        CrashPoint::BeforeMarker,
        CrashPoint::BeforeFree,
        CrashPoint::BeforeCommit,
    ];

    /// Number of byte stores allowed to land before power is lost, for a
    /// put on a rotating buffer that stores `payload_stores` payload bytes.
    pub fn store_budget(self, payload_stores: usize) -> usize {
        match self {
            CrashPoint::BeforePayload => 0,
            CrashPoint::DuringPayload => payload_stores / 2,
            CrashPoint::BeforeMarker => payload_stores,
            CrashPoint::BeforeFree => payload_stores + 1,
            CrashPoint::BeforeCommit => usize::MAX,
        }
    }
}

/// Result of a power-loss test.
#[derive(Debug, Clone)]
pub struct CrashRecoveryResult {
    /// Whether the test passed.
    pub passed: bool,
    /// Description of what was tested.
    pub description: String,
    /// Record expected after restart.
    pub expected: Option<Vec<u8>>,
    /// Record found after restart.
    pub actual: Option<Vec<u8>>,
    /// Any error message.
    pub error: Option<String>,
}

impl CrashRecoveryResult {
    /// Creates a passing result.
    pub fn pass(description: &str, record: Option<Vec<u8>>) -> Self {
        Self {
            passed: true,
            description: description.to_string(),
            expected: record.clone(),
            actual: record,
            error: None,
        }
    }

    /// Creates a failing result.
    pub fn fail(
        description: &str,
        expected: Option<Vec<u8>>,
        actual: Option<Vec<u8>>,
        error: &str,
    ) -> Self {
        Self {
            passed: false,
            description: description.to_string(),
            expected,
            actual,
            error: Some(error.to_string()),
        }
    }
}

/// A medium wrapper that can simulate power loss.
///
/// Reads always reach the inner medium. Stores are counted; once the budget
/// set with [`crash_after`](Self::crash_after) is spent, every store fails
/// with an I/O error and is dropped. `update` only stores changed bytes, so
/// unchanged bytes do not use up the budget.
pub struct CrashableMedium {
    inner: Box<dyn Medium>,
    crash_after_stores: AtomicUsize,
    stores: AtomicUsize,
    crashed: AtomicBool,
    fail_on_commit: AtomicBool,
}

impl CrashableMedium {
    /// Creates a crashable medium wrapping an inner medium.
    pub fn new(inner: Box<dyn Medium>) -> Self {
        Self {
            inner,
            crash_after_stores: AtomicUsize::new(usize::MAX),
            stores: AtomicUsize::new(0),
            crashed: AtomicBool::new(false),
            fail_on_commit: AtomicBool::new(false),
        }
    }

    /// Creates a crashable medium over an uninitialized RAM medium.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryMedium::empty()))
    }

    /// Lets `stores` more byte stores land, then loses power.
    pub fn crash_after(&self, stores: usize) {
        self.stores.store(0, Ordering::SeqCst);
        self.crash_after_stores.store(stores, Ordering::SeqCst);
    }

    /// Sets whether commit should fail.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Restores power.
    pub fn reset(&self) {
        self.crash_after_stores.store(usize::MAX, Ordering::SeqCst);
        self.stores.store(0, Ordering::SeqCst);
        self.crashed.store(false, Ordering::SeqCst);
        self.fail_on_commit.store(false, Ordering::SeqCst);
    }

    /// Returns whether power has been lost.
    pub fn has_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }

    /// Returns the stores that landed since the last `crash_after` or `reset`.
    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    fn power_loss(&self, what: &str) -> MediumError {
        self.crashed.store(true, Ordering::SeqCst);
        MediumError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("simulated power loss during {what}"),
        ))
    }
}

impl Medium for CrashableMedium {
    fn read(&self, address: usize) -> MediumResult<u8> {
        self.inner.read(address)
    }

    fn write(&mut self, address: usize, value: u8) -> MediumResult<()> {
        if self.has_crashed() {
            return Err(self.power_loss("store"));
        }
        let landed = self.stores.load(Ordering::SeqCst);
        if landed >= self.crash_after_stores.load(Ordering::SeqCst) {
            return Err(self.power_loss("store"));
        }
        self.inner.write(address, value)?;
        self.stores.store(landed + 1, Ordering::SeqCst);
        Ok(())
    }

    fn commit(&mut self) -> MediumResult<()> {
        if self.has_crashed() || self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(self.power_loss("commit"));
        }
        self.inner.commit()
    }

    fn init(&mut self, size_hint: usize) -> MediumResult<()> {
        self.inner.init(size_hint)
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// What one trial observed after restart.
struct Trial {
    put_landed: bool,
    record: Option<Vec<u8>>,
    valid: usize,
}

/// Harness for power-loss scenarios on one buffer configuration.
///
/// Each trial runs on a fresh RAM medium: optionally put filler records to
/// advance the ring, store an old record, lose power part way through
/// storing a new one, restart and read back. The store count of the
/// interrupted put is derived from what its target block held, so records
/// may share bytes.
pub struct CrashRecoveryHarness {
    config: Config,
    old_record: Vec<u8>,
    new_record: Vec<u8>,
    prior_puts: usize,
    /// Results of the trials run so far.
    pub results: Vec<CrashRecoveryResult>,
}

impl CrashRecoveryHarness {
    /// Creates a harness for `config` with records `0x11..` then `0x22..`.
    pub fn new(config: Config) -> Self {
        let payload = config.payload_size;
        Self {
            config,
            old_record: vec![0x11; payload],
            new_record: vec![0x22; payload],
            prior_puts: 0,
            results: Vec::new(),
        }
    }

    /// Uses `old` as the stored record and `new` as the interrupted one.
    ///
    /// # Panics
    ///
    /// Panics if either record is not exactly the configured payload size.
    #[must_use]
    pub fn with_records(mut self, old: Vec<u8>, new: Vec<u8>) -> Self {
        assert_eq!(old.len(), self.config.payload_size, "old record size");
        assert_eq!(new.len(), self.config.payload_size, "new record size");
        self.old_record = old;
        self.new_record = new;
        self
    }

    /// Puts `count` filler records before the old record.
    #[must_use]
    pub fn with_prior_puts(mut self, count: usize) -> Self {
        self.prior_puts = count;
        self
    }

    /// Fills the ring so the old record sits in the last block and the
    /// interrupted put wraps around to the first.
    #[must_use]
    pub fn wrapping(self) -> Self {
        let count = self.config.block_count.saturating_sub(1);
        self.with_prior_puts(count)
    }

    /// Record stored before the interrupted put.
    pub fn old_record(&self) -> &[u8] {
        &self.old_record
    }

    /// Record of the interrupted put.
    pub fn new_record(&self) -> &[u8] {
        &self.new_record
    }

    /// Filler record; differs from the new record in every byte.
    fn filler(&self) -> Vec<u8> {
        self.new_record.iter().map(|b| !b).collect()
    }

    /// Payload the interrupted put's target block holds before the put.
    fn target_payload(&self) -> Vec<u8> {
        let blocks = self.config.block_count;
        if blocks == 1 {
            return self.old_record.clone();
        }
        // Puts before the interrupted one: fillers, then the old record
        let landed = self.prior_puts + 1;
        if landed >= blocks {
            self.filler()
        } else {
            vec![0xFF; self.config.payload_size]
        }
    }

    /// Payload bytes the interrupted put stores.
    pub fn payload_stores(&self) -> usize {
        self.target_payload()
            .iter()
            .zip(&self.new_record)
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Byte stores performed by one put that replaces the old record.
    pub fn stores_per_put(&self) -> usize {
        // Payload bytes, the new marker and the freed old marker
        self.payload_stores() + 2
    }

    /// Record that must survive once `budget` stores of the put landed.
    pub fn expected_after(&self, budget: usize) -> Option<Vec<u8>> {
        let payload = self.payload_stores();
        if self.config.block_count == 1 {
            // The marker is freed first, then payload, then the new marker
            match budget {
                0 => Some(self.old_record.clone()),
                b if b <= payload + 1 => None,
                _ => Some(self.new_record.clone()),
            }
        } else if budget <= payload {
            Some(self.old_record.clone())
        } else {
            Some(self.new_record.clone())
        }
    }

    /// Loses power after `budget` stores of the second put.
    pub fn run_budget(&mut self, budget: usize, fail_commit: bool) -> CrashRecoveryResult {
        let description = if fail_commit {
            format!("power loss at commit after {budget} stores")
        } else {
            format!("power loss after {budget} stores")
        };
        let expected = if fail_commit {
            Some(self.new_record.clone())
        } else {
            self.expected_after(budget)
        };

        let put_should_land = !fail_commit && budget >= self.stores_per_put();

        let result = match self.trial(budget, fail_commit) {
            Ok(trial) if trial.put_landed != put_should_land => CrashRecoveryResult::fail(
                &description,
                expected,
                trial.record,
                "put result does not match the store budget",
            ),
            Ok(trial) if trial.record != expected => CrashRecoveryResult::fail(
                &description,
                expected,
                trial.record,
                "wrong record after restart",
            ),
            Ok(trial) if trial.valid > 1 => CrashRecoveryResult::fail(
                &description,
                expected,
                trial.record,
                &format!("{} valid markers after restart", trial.valid),
            ),
            Ok(trial) => CrashRecoveryResult::pass(&description, trial.record),
            Err(e) => CrashRecoveryResult::fail(&description, expected, None, &e.to_string()),
        };

        self.results.push(result.clone());
        result
    }

    /// Loses power at a named point of the second put.
    pub fn run_point(&mut self, point: CrashPoint) -> CrashRecoveryResult {
        let fail_commit = point == CrashPoint::BeforeCommit;
        let budget = if fail_commit {
            self.stores_per_put()
        } else {
            point.store_budget(self.payload_stores())
        };
        self.run_budget(budget, fail_commit)
    }

    /// Loses power after every possible number of stores, then at commit.
    pub fn run_every_store(&mut self) -> &[CrashRecoveryResult] {
        for budget in 0..=self.stores_per_put() {
            self.run_budget(budget, false);
        }
        self.run_budget(self.stores_per_put(), true);
        &self.results
    }

    /// Returns whether every trial so far passed.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Returns the trials that failed.
    pub fn failures(&self) -> Vec<&CrashRecoveryResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    fn trial(&self, budget: usize, fail_commit: bool) -> CoreResult<Trial> {
        let medium = SharedMedium::new(CrashableMedium::in_memory());

        let mut buffer = WearLevelBuffer::open(self.config.clone(), medium.clone())?;
        let filler = self.filler();
        for _ in 0..self.prior_puts {
            buffer.put(&filler)?;
        }
        buffer.put(&self.old_record)?;

        {
            let guard = medium.lock();
            guard.crash_after(budget);
            guard.set_fail_on_commit(fail_commit);
        }
        let put_landed = buffer.put(&self.new_record).is_ok();
        medium.lock().reset();
        drop(buffer);

        let restarted = WearLevelBuffer::open(self.config.clone(), medium.clone())?;
        let record = restarted.get()?;
        let valid = recovery::classify(restarted.geometry(), &*medium.lock())?.valid.len();
        Ok(Trial {
            put_landed,
            record,
            valid,
        })
    }
}
