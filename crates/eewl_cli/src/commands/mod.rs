//! CLI command implementations.

pub mod dump;
pub mod format;
pub mod get;
pub mod inspect;
pub mod put;
pub mod verify;

use eewl_core::{recovery, Config, CoreError, Geometry, WearLevelBuffer};
use eewl_medium::{FileMedium, Medium, MediumError, SharedMedium};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The image file does not exist.
    #[error("No medium image found at {0:?}")]
    MissingImage(PathBuf),

    /// The image ends before the buffer does.
    #[error("Image holds {size} bytes, the buffer ends at {needed:#X}")]
    ImageTooSmall {
        /// Image size in bytes.
        size: usize,
        /// End address of the buffer.
        needed: usize,
    },

    /// A hex argument could not be parsed.
    #[error("Invalid hex bytes: {0}")]
    InvalidHex(String),

    /// Verification found inconsistent markers.
    #[error("Buffer markers are inconsistent")]
    VerificationFailed,

    /// Engine error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Medium error.
    #[error(transparent)]
    Medium(#[from] MediumError),

    /// JSON output error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Parses an address given in decimal or with a `0x` prefix in hex.
pub fn parse_address(s: &str) -> Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

/// Parses bytes written as hex, with optional whitespace between bytes.
pub fn parse_hex(s: &str) -> CliResult<Vec<u8>> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::InvalidHex(s.to_string()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::InvalidHex(s.to_string()))
        })
        .collect()
}

/// Formats bytes as space-separated upper-case hex.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Opens an existing image for read-only inspection.
///
/// The image is not initialized or grown; it must already cover the buffer.
pub fn open_existing(path: &Path, config: &Config) -> CliResult<(Geometry, FileMedium)> {
    if !path.exists() {
        return Err(CliError::MissingImage(path.to_path_buf()));
    }
    let geometry = config.geometry()?;
    let medium = FileMedium::open(path)?;
    if medium.capacity() < geometry.end_address() {
        return Err(CliError::ImageTooSmall {
            size: medium.capacity(),
            needed: geometry.end_address(),
        });
    }
    Ok((geometry, medium))
}

/// Opens a started buffer on an image, creating the image if needed.
///
/// Starting the buffer may repair an interrupted put or reformat
/// inconsistent markers, as any `begin` does.
pub fn open_buffer(path: &Path, config: &Config) -> CliResult<WearLevelBuffer<FileMedium>> {
    let medium = SharedMedium::new(FileMedium::open_with_create_dirs(path)?);
    let mut buffer = WearLevelBuffer::new(config.clone(), medium)?;
    let report = buffer.begin()?;
    if report.repaired() {
        tracing::info!(outcome = ?report.outcome, "image repaired while starting buffer");
    }
    Ok(buffer)
}

/// Reads the current record of an image without writing to it.
pub fn read_record(
    geometry: &Geometry,
    medium: &FileMedium,
    classification: &recovery::Classification,
) -> CliResult<Option<Vec<u8>>> {
    match classification.settled_state().current {
        Some(address) => {
            let mut record = vec![0u8; geometry.payload_size()];
            medium.read_into(address + 1, &mut record)?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_in_decimal_and_hex() {
        assert_eq!(parse_address("16").unwrap(), 16);
        assert_eq!(parse_address("0x10").unwrap(), 16);
        assert_eq!(parse_address("0X1f").unwrap(), 31);
        assert!(parse_address("0xZZ").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn hex_bytes() {
        assert_eq!(parse_hex("01 02 0a FF").unwrap(), vec![1, 2, 10, 255]);
        assert_eq!(parse_hex("01020304").unwrap(), vec![1, 2, 3, 4]);
        assert!(parse_hex("123").is_err());
        assert!(parse_hex("zz").is_err());
        assert_eq!(format_hex(&[1, 0xAB]), "01 AB");
    }

    #[test]
    fn missing_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_existing(&dir.path().join("none.img"), &Config::new(4));
        assert!(matches!(result, Err(CliError::MissingImage(_))));
    }

    #[test]
    fn short_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.img");
        std::fs::write(&path, [0xFF; 8]).unwrap();

        let result = open_existing(&path, &Config::new(4));
        assert!(matches!(
            result,
            Err(CliError::ImageTooSmall { size: 8, needed: 51 })
        ));
    }
}
