//! Get command implementation.

use super::{format_hex, open_buffer, CliResult};
use eewl_core::Config;
use serde::Serialize;
use std::path::Path;

/// Record read from a buffer.
#[derive(Debug, Serialize)]
pub struct GetResult {
    /// Address of the current block, absent when empty.
    pub block: Option<usize>,
    /// Record bytes, hex.
    pub record: Option<String>,
}

/// Reads the current record.
pub fn get(path: &Path, config: &Config) -> CliResult<GetResult> {
    let buffer = open_buffer(path, config)?;
    let record = buffer.get()?;

    Ok(GetResult {
        block: buffer.current_block_address(),
        record: record.as_deref().map(format_hex),
    })
}

/// Runs the get command.
pub fn run(path: &Path, config: &Config, format: &str) -> CliResult<()> {
    let result = get(path, config)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => match &result.record {
            Some(record) => println!("{record}"),
            None => println!("No data"),
        },
    }
    Ok(())
}
