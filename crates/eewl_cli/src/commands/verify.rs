//! Verify command implementation.

use super::{open_existing, CliError, CliResult};
use eewl_core::recovery::{self, Verdict};
use eewl_core::Config;
use std::path::Path;

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of block markers checked.
    pub blocks_checked: usize,
    /// Addresses of blocks carrying a valid marker.
    pub valid_blocks: Vec<usize>,
    /// Classification of the markers.
    pub verdict: Verdict,
}

impl VerifyResult {
    /// Returns `true` unless the markers can only be resolved by reformatting.
    pub fn is_ok(&self) -> bool {
        !matches!(self.verdict, Verdict::Corrupted)
    }
}

/// Checks the markers of an image without repairing them.
pub fn verify(path: &Path, config: &Config) -> CliResult<VerifyResult> {
    let (geometry, medium) = open_existing(path, config)?;
    let classification = recovery::classify(&geometry, &medium)?;

    Ok(VerifyResult {
        blocks_checked: geometry.block_count(),
        valid_blocks: classification.valid.iter().map(|b| b.address).collect(),
        verdict: classification.verdict,
    })
}

/// Runs the verify command.
pub fn run(path: &Path, config: &Config) -> CliResult<()> {
    println!("Verifying buffer in {:?}", path);
    println!();

    let result = verify(path, config)?;
    print_result(&result);

    if !result.is_ok() {
        return Err(CliError::VerificationFailed);
    }
    Ok(())
}

fn print_result(result: &VerifyResult) {
    println!("  Blocks checked: {}", result.blocks_checked);
    println!("  Valid markers: {}", result.valid_blocks.len());
    match result.verdict {
        Verdict::Empty => println!("  Status: OK (empty)"),
        Verdict::Current { block } => {
            println!("  Status: OK (current block {:#X}, marker {})", block.address, block.marker);
        }
        Verdict::Interrupted { newer, older } => {
            println!("  Status: OK (interrupted write)");
            println!(
                "    Next start keeps {:#X} and frees {:#X}",
                newer.address, older.address
            );
        }
        Verdict::Corrupted => {
            println!("  Status: CORRUPTED");
            println!("    Valid blocks: {:X?}", result.valid_blocks);
            println!("    Next start reformats the buffer");
        }
    }
}
