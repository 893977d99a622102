//! Dump command implementation.

use super::{open_existing, CliResult};
use eewl_core::{dump_blocks, recovery, BlockDump, Config, ControlDump};
use std::path::Path;

/// Captures the control fields and every block of an image.
pub fn dump(path: &Path, config: &Config) -> CliResult<(ControlDump, Vec<BlockDump>)> {
    let (geometry, medium) = open_existing(path, config)?;
    let classification = recovery::classify(&geometry, &medium)?;
    let control = ControlDump::capture(&geometry, &classification.settled_state());
    let blocks = dump_blocks(&geometry, &medium)?;
    Ok((control, blocks))
}

/// Runs the dump command.
pub fn run(path: &Path, config: &Config) -> CliResult<()> {
    let (control, blocks) = dump(path, config)?;

    println!("{control}");
    println!();
    for block in &blocks {
        println!("{block}");
    }
    Ok(())
}
