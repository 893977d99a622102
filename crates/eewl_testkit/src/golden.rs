//! Golden layouts for format verification.
//!
//! Each layout fixes a configuration, a sequence of puts and the exact bytes
//! the buffer region must hold afterwards. A change to the marker sequence,
//! the block layout or the store order shows up here first.

use eewl_core::{Config, CoreResult, WearLevelBuffer};
use eewl_medium::{InMemoryMedium, SharedMedium};

/// A buffer region image expected after a sequence of puts.
#[derive(Debug, Clone)]
pub struct GoldenLayout {
    /// Description of the layout.
    pub description: &'static str,
    /// Buffer configuration.
    pub config: Config,
    /// Records stored in order on an erased medium.
    pub records: Vec<Vec<u8>>,
    /// Expected bytes from the start address to the end address (hex).
    pub expected_hex: &'static str,
}

impl GoldenLayout {
    /// Stores the records on a fresh RAM medium and returns the buffer region.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a put fails.
    pub fn render(&self) -> CoreResult<Vec<u8>> {
        let medium = SharedMedium::new(InMemoryMedium::empty());
        let mut buffer = WearLevelBuffer::open(self.config.clone(), medium.clone())?;
        for record in &self.records {
            buffer.put(record)?;
        }

        let geometry = buffer.geometry();
        let data = medium.lock().data();
        Ok(data[geometry.start_address()..geometry.end_address()].to_vec())
    }

    /// Asserts that rendering the layout yields the expected bytes.
    ///
    /// # Panics
    ///
    /// Panics with both images in hex if they differ.
    pub fn assert_matches(&self) {
        let actual = self
            .render()
            .unwrap_or_else(|e| panic!("Golden layout '{}' failed: {e}", self.description));
        let expected = hex_decode(self.expected_hex);

        if actual != expected {
            panic!(
                "Golden layout '{}' failed:\n\
                 Expected ({} bytes): {}\n\
                 Actual ({} bytes): {}",
                self.description,
                expected.len(),
                hex_encode(&expected),
                actual.len(),
                hex_encode(&actual)
            );
        }
    }
}

/// Returns the standard golden layouts.
#[must_use]
pub fn standard_layouts() -> Vec<GoldenLayout> {
    let three_blocks = Config::new(4).block_count(3).start_address(1);
    vec![
        GoldenLayout {
            description: "first put lands in the first block with tag FD",
            config: three_blocks.clone(),
            records: vec![vec![1, 2, 3, 4]],
            expected_hex: "fd01020304 ffffffffff ffffffffff",
        },
        GoldenLayout {
            description: "second put frees the first marker, payload stays",
            config: three_blocks.clone(),
            records: vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]],
            expected_hex: "ff01020304 fb05060708 ffffffffff",
        },
        GoldenLayout {
            description: "fourth put wraps to the first block with tag EF",
            config: three_blocks,
            records: vec![vec![1; 4], vec![2; 4], vec![3; 4], vec![4; 4]],
            expected_hex: "ef04040404 ff02020202 ff03030303",
        },
        GoldenLayout {
            description: "tag wraps from 7F back to FE after eight puts",
            config: Config::new(1).block_count(8).start_address(0x10),
            records: (1..=8u8).map(|i| vec![i]).collect(),
            expected_hex: "ff01 ff02 ff03 ff04 ff05 ff06 ff07 fe08",
        },
        GoldenLayout {
            description: "single block is rewritten in place",
            config: Config::new(2).block_count(1).start_address(4),
            records: vec![vec![1, 2], vec![3, 4]],
            expected_hex: "fb0304",
        },
    ]
}

/// Encodes bytes as hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal string to bytes, ignoring whitespace.
///
/// # Panics
///
/// Panics on a non-hex digit or an odd digit count.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layouts_match() {
        for layout in standard_layouts() {
            layout.assert_matches();
        }
    }

    #[test]
    fn hex_roundtrip() {
        assert_eq!(hex_decode("fd 01\nff"), vec![0xFD, 0x01, 0xFF]);
        assert_eq!(hex_encode(&[0xFD, 0x01, 0xFF]), "fd01ff");
    }

    #[test]
    #[should_panic(expected = "Golden layout")]
    fn mismatch_panics() {
        let mut layout = standard_layouts().remove(0);
        layout.expected_hex = "fe01020304 ffffffffff ffffffffff";
        layout.assert_matches();
    }
}
