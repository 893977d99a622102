//! Inspect command implementation.

use super::{format_hex, open_existing, read_record, CliResult};
use eewl_core::{recovery, Config, ControlDump, RecoveryOutcome};
use eewl_medium::Medium;
use serde::Serialize;
use std::path::Path;

/// Buffer inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Image path.
    pub path: String,
    /// Image size in bytes.
    pub image_size: usize,
    /// Marker byte plus payload.
    pub block_size: usize,
    /// Blocks in rotation.
    pub block_count: usize,
    /// Address of the first block.
    pub start_address: usize,
    /// First address past the buffer.
    pub end_address: usize,
    /// Current block address, 0 when empty.
    pub current_address: usize,
    /// Generation tag of the current block, hex.
    pub last_marker: String,
    /// What the next `begin` will do.
    pub state: String,
    /// Addresses of blocks carrying a valid marker.
    pub valid_blocks: Vec<usize>,
    /// Current record, hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

/// Inspects an image without modifying it.
pub fn inspect(path: &Path, config: &Config) -> CliResult<InspectResult> {
    let (geometry, medium) = open_existing(path, config)?;
    let classification = recovery::classify(&geometry, &medium)?;
    let control = ControlDump::capture(&geometry, &classification.settled_state());
    let record = read_record(&geometry, &medium, &classification)?;

    let state = match classification.verdict {
        recovery::Verdict::Empty => RecoveryOutcome::Empty,
        recovery::Verdict::Current { block } => RecoveryOutcome::Current {
            address: block.address,
        },
        recovery::Verdict::Interrupted { newer, older } => {
            RecoveryOutcome::ResolvedInterruptedWrite {
                kept: newer.address,
                freed: older.address,
            }
        }
        recovery::Verdict::Corrupted => RecoveryOutcome::Reformatted {
            valid_markers: classification.valid.len(),
        },
    };

    Ok(InspectResult {
        path: path.display().to_string(),
        image_size: medium.capacity(),
        block_size: control.block_size,
        block_count: control.block_count,
        start_address: control.start_address,
        end_address: control.end_address,
        current_address: control.current_address,
        last_marker: control.last_marker.to_string(),
        state: describe(&state),
        valid_blocks: classification.valid.iter().map(|b| b.address).collect(),
        record: record.as_deref().map(format_hex),
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, config: &Config, format: &str) -> CliResult<()> {
    let result = inspect(path, config)?;

    // Output
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn describe(outcome: &RecoveryOutcome) -> String {
    match outcome {
        RecoveryOutcome::Empty => "empty".to_string(),
        RecoveryOutcome::Current { address } => format!("current block {address:#X}"),
        RecoveryOutcome::ResolvedInterruptedWrite { kept, freed } => {
            format!("interrupted write: keeps {kept:#X}, frees {freed:#X}")
        }
        RecoveryOutcome::Reformatted { valid_markers } => {
            format!("corrupted: {valid_markers} valid markers, will reformat")
        }
    }
}

fn print_text_output(result: &InspectResult) {
    println!("Image: {}", result.path);
    println!("Image size: {} bytes", result.image_size);
    println!();
    println!("=== Layout ===");
    println!("Block size: {} bytes", result.block_size);
    println!("Blocks: {}", result.block_count);
    println!("Start address: {:#X}", result.start_address);
    println!("End address: {:#X}", result.end_address);
    println!();
    println!("=== State ===");
    println!("State: {}", result.state);
    println!("Current block: {:#X}", result.current_address);
    println!("Last marker: {}", result.last_marker);
    println!("Valid blocks: {:X?}", result.valid_blocks);
    match &result.record {
        Some(record) => println!("Record: {record}"),
        None => println!("Record: none"),
    }
}
