//! Put command implementation.

use super::{format_hex, open_buffer, parse_hex, CliResult};
use eewl_core::Config;
use std::path::Path;

/// Runs the put command.
pub fn run(path: &Path, config: &Config, hex: &str) -> CliResult<()> {
    let record = parse_hex(hex)?;
    let mut buffer = open_buffer(path, config)?;
    buffer.put(&record)?;

    println!(
        "Stored {} at block {:#X} (marker {})",
        format_hex(&record),
        buffer.current_block_address().unwrap_or_default(),
        buffer.last_marker()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CliError;
    use eewl_core::CoreError;

    #[test]
    fn put_stores_record() {
        let config = Config::new(2).start_address(0x20);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.img");

        run(&path, &config, "0a 0b").unwrap();
        run(&path, &config, "0c0d").unwrap();

        let image = std::fs::read(&path).unwrap();
        assert_eq!(&image[0x20..0x26], &[0xFF, 0x0A, 0x0B, 0xFB, 0x0C, 0x0D]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.img");

        let result = run(&path, &Config::new(2), "01 02 03");
        assert!(matches!(
            result,
            Err(CliError::Core(CoreError::PayloadSize { expected: 2, actual: 3 }))
        ));
    }
}
