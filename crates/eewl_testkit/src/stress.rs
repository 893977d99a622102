//! Wear stress tests for eewl.
//!
//! These runs put many records through one buffer and report how the stores
//! were spread across its blocks.

use eewl_core::{Config, CoreResult, WearLevelBuffer};
use eewl_medium::{InMemoryMedium, SharedMedium};
use std::time::{Duration, Instant};

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of puts to perform.
    pub operations: usize,
    /// Buffer configuration.
    pub buffer: Config,
    /// Restart the buffer every this many puts, 0 for never.
    pub restart_every: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            buffer: Config::new(16).block_count(10).start_address(0x10),
            restart_every: 0,
        }
    }
}

/// Store counts observed at each block after a stress run.
#[derive(Debug, Clone)]
pub struct WearReport {
    /// Puts performed.
    pub puts: usize,
    /// Stores to each block's marker byte, in ring order.
    pub marker_wear: Vec<u64>,
    /// Stores to each block's payload bytes, in ring order.
    pub payload_wear: Vec<u64>,
    /// Total duration.
    pub duration: Duration,
}

impl WearReport {
    /// Fewest marker stores on any block.
    pub fn min_marker_wear(&self) -> u64 {
        self.marker_wear.iter().copied().min().unwrap_or(0)
    }

    /// Most marker stores on any block.
    pub fn max_marker_wear(&self) -> u64 {
        self.marker_wear.iter().copied().max().unwrap_or(0)
    }

    /// Difference between the most and least worn markers.
    pub fn spread(&self) -> u64 {
        self.max_marker_wear() - self.min_marker_wear()
    }

    /// Puts per second.
    pub fn puts_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.puts as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Puts: {}", self.puts);
        println!("Marker wear: {:?}", self.marker_wear);
        println!("Payload wear: {:?}", self.payload_wear);
        println!("Spread: {}", self.spread());
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} puts/sec", self.puts_per_second());
    }
}

/// Runs sequential puts of changing records on a RAM medium.
///
/// # Errors
///
/// Returns an error if the buffer cannot be opened or a put fails.
pub fn stress_sequential_puts(config: &StressConfig) -> CoreResult<WearReport> {
    let medium = SharedMedium::new(InMemoryMedium::empty());
    let mut buffer = WearLevelBuffer::open(config.buffer.clone(), medium.clone())?;
    let payload_size = config.buffer.payload_size;

    let start = Instant::now();
    for i in 0..config.operations {
        let record: Vec<u8> = (0..payload_size).map(|j| (i + j) as u8).collect();
        buffer.put(&record)?;

        if config.restart_every > 0 && (i + 1) % config.restart_every == 0 {
            buffer = WearLevelBuffer::open(config.buffer.clone(), medium.clone())?;
        }
    }
    let duration = start.elapsed();

    let guard = medium.lock();
    let geometry = buffer.geometry();
    let marker_wear = geometry.blocks().map(|a| guard.write_count(a)).collect();
    let payload_wear = geometry
        .blocks()
        .map(|a| (a + 1..a + geometry.block_size()).map(|p| guard.write_count(p)).sum())
        .collect();

    Ok(WearReport {
        puts: config.operations,
        marker_wear,
        payload_wear,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wear_is_even_across_blocks() {
        let config = StressConfig {
            operations: 1_000,
            ..Default::default()
        };
        let report = stress_sequential_puts(&config).unwrap();

        // 100 visits per block: set then free, except the final block
        assert_eq!(report.max_marker_wear(), 200);
        assert!(report.spread() <= 1, "{report:?}");
    }

    #[test]
    fn payload_wear_follows_marker_wear() {
        let config = StressConfig {
            operations: 500,
            buffer: Config::new(2).block_count(5).start_address(1),
            restart_every: 0,
        };
        let report = stress_sequential_puts(&config).unwrap();
        let min = report.payload_wear.iter().min().copied().unwrap();
        let max = report.payload_wear.iter().max().copied().unwrap();
        assert!(max - min <= 2, "{report:?}");
    }

    #[test]
    fn restarts_do_not_disturb_rotation() {
        let config = StressConfig {
            operations: 1_000,
            restart_every: 7,
            ..Default::default()
        };
        let report = stress_sequential_puts(&config).unwrap();
        assert!(report.spread() <= 1, "{report:?}");
    }
}
