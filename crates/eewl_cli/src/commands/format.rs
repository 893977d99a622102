//! Format command implementation.

use super::{open_buffer, CliResult};
use eewl_core::Config;
use std::path::Path;

/// Runs the format command.
pub fn run(path: &Path, config: &Config) -> CliResult<()> {
    let mut buffer = open_buffer(path, config)?;
    buffer.fast_format()?;

    let geometry = buffer.geometry();
    println!(
        "Formatted {} blocks from {:#X} to {:#X}",
        geometry.block_count(),
        geometry.start_address(),
        geometry.end_address()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_erases_record() {
        let config = Config::new(4);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.img");
        open_buffer(&path, &config).unwrap().put(&[1; 4]).unwrap();

        run(&path, &config).unwrap();
        assert_eq!(open_buffer(&path, &config).unwrap().get().unwrap(), None);
    }

    #[test]
    fn format_creates_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("eeprom.img");

        run(&path, &Config::new(4)).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0x100);
    }
}
