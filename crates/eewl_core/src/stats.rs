//! Buffer statistics.
//!
//! Counters for monitoring how a buffer is used and how often recovery had
//! to repair it.
//!
//! # Usage
//!
//! ```rust,ignore
//! let buffer = WearLevelBuffer::open(config, medium)?;
//! buffer.put(&record)?;
//!
//! let stats = buffer.stats().snapshot();
//! println!("Puts: {}", stats.puts);
//! println!("Reformats: {}", stats.corruption_reformats);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Buffer statistics.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct BufferStats {
    /// Successful puts.
    puts: AtomicU64,
    /// Payload bytes handed to successful puts.
    bytes_written: AtomicU64,
    /// Gets, found or not.
    gets: AtomicU64,
    /// Gets that found a record.
    hits: AtomicU64,
    /// Explicit and recovery-triggered formats.
    formats: AtomicU64,
    /// Recovery scans.
    scans: AtomicU64,
    /// Interrupted puts resolved by a scan.
    interrupted_writes: AtomicU64,
    /// Scans that found corruption and reformatted.
    corruption_reformats: AtomicU64,
    /// Operations that failed with a medium error.
    errors: AtomicU64,
}

impl BufferStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_put(&self, bytes: u64) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_format(&self) {
        self.formats.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_interrupted_write(&self) {
        self.interrupted_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_corruption(&self) {
        self.corruption_reformats.fetch_add(1, Ordering::Relaxed);
        self.formats.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of successful puts.
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Returns the number of gets.
    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    /// Returns the number of formats, including recovery reformats.
    pub fn formats(&self) -> u64 {
        self.formats.load(Ordering::Relaxed)
    }

    /// Returns the number of scans that reformatted a corrupted buffer.
    pub fn corruption_reformats(&self) -> u64 {
        self.corruption_reformats.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            puts: self.puts(),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            gets: self.gets(),
            hits: self.hits.load(Ordering::Relaxed),
            formats: self.formats(),
            scans: self.scans.load(Ordering::Relaxed),
            interrupted_writes: self.interrupted_writes.load(Ordering::Relaxed),
            corruption_reformats: self.corruption_reformats(),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of buffer statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Successful puts.
    pub puts: u64,
    /// Payload bytes handed to successful puts.
    pub bytes_written: u64,
    /// Gets, found or not.
    pub gets: u64,
    /// Gets that found a record.
    pub hits: u64,
    /// Explicit and recovery-triggered formats.
    pub formats: u64,
    /// Recovery scans.
    pub scans: u64,
    /// Interrupted puts resolved by a scan.
    pub interrupted_writes: u64,
    /// Scans that found corruption and reformatted.
    pub corruption_reformats: u64,
    /// Operations that failed with a medium error.
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = BufferStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = BufferStats::new();
        stats.record_put(4);
        stats.record_put(4);
        stats.record_get(true);
        stats.record_get(false);

        let snap = stats.snapshot();
        assert_eq!(snap.puts, 2);
        assert_eq!(snap.bytes_written, 8);
        assert_eq!(snap.gets, 2);
        assert_eq!(snap.hits, 1);
    }

    #[test]
    fn corruption_counts_as_format() {
        let stats = BufferStats::new();
        stats.record_format();
        stats.record_corruption();

        assert_eq!(stats.formats(), 2);
        assert_eq!(stats.corruption_reformats(), 1);
    }
}
