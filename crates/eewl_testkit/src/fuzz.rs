//! Fuzz testing harnesses for eewl.
//!
//! These targets take raw bytes, so they can be driven by cargo-fuzz or
//! any other fuzzing framework. They panic on a broken invariant and never
//! on malformed input.

use eewl_core::{recovery, Config, RecoveryOutcome, WearLevelBuffer};
use eewl_medium::{InMemoryMedium, SharedMedium};

/// Derives a small buffer configuration from the first three input bytes.
fn config_from(header: &[u8]) -> Config {
    let payload_size = 1 + usize::from(header[0] % 8);
    let block_count = 1 + usize::from(header[1] % 12);
    let start = 1 + usize::from(header[2] % 32);
    Config::new(payload_size)
        .block_count(block_count)
        .start_address(start)
}

/// Checks the recovery scan against an arbitrary medium image.
///
/// After `begin`:
/// - at most one block carries a valid marker
/// - a record, if any, is the payload of that block
/// - a put followed by a get returns the put record, also after a restart
///
/// # Panics
///
/// Panics if any of the above does not hold.
pub fn check_recovery_image(config: Config, image: Vec<u8>) {
    let medium = SharedMedium::new(InMemoryMedium::with_data(image));
    let mut buffer = match WearLevelBuffer::open(config.clone(), medium.clone()) {
        Ok(buffer) => buffer,
        Err(e) => panic!("begin failed on a well-sized image: {e}"),
    };

    let classification = recovery::classify(buffer.geometry(), &*medium.lock())
        .unwrap_or_else(|e| panic!("scan failed: {e}"));
    assert!(
        classification.valid.len() <= 1,
        "{} valid markers after begin",
        classification.valid.len()
    );

    let record = buffer.get().unwrap_or_else(|e| panic!("get failed: {e}"));
    match (classification.valid.first(), &record) {
        (None, None) => {}
        (Some(block), Some(payload)) => {
            assert_eq!(buffer.current_block_address(), Some(block.address));
            let stored = medium.with(|m| m.data()[block.address + 1..][..payload.len()].to_vec());
            assert_eq!(&stored, payload);
        }
        (block, record) => panic!("marker {block:?} disagrees with record {record:?}"),
    }

    let next = vec![0xA5; config.payload_size];
    buffer.put(&next).unwrap_or_else(|e| panic!("put failed: {e}"));
    assert_eq!(buffer.get().ok().flatten().as_ref(), Some(&next));

    let mut restarted = WearLevelBuffer::new(config, medium)
        .unwrap_or_else(|e| panic!("restart failed: {e}"));
    let report = restarted.begin().unwrap_or_else(|e| panic!("begin failed: {e}"));
    assert!(matches!(report.outcome, RecoveryOutcome::Current { .. }));
    assert_eq!(restarted.get().ok().flatten(), Some(next));
}

/// Fuzz target for the recovery scan.
///
/// The first three bytes choose a configuration; the rest is the image of
/// the buffer region, padded with erased bytes.
pub fn fuzz_recovery_image(data: &[u8]) {
    if data.len() < 3 {
        return;
    }
    let config = config_from(&data[..3]);
    let end = match config.geometry() {
        Ok(geometry) => geometry.end_address(),
        Err(_) => return,
    };

    let mut image: Vec<u8> = data[3..].iter().copied().take(end).collect();
    image.resize(end, 0xFF);
    check_recovery_image(config, image);
}

/// Fuzz target for buffer operations.
///
/// Runs an operation sequence decoded from `data` against a model holding
/// the last record, and checks every read against it.
pub fn fuzz_operations(data: &[u8]) {
    if data.len() < 3 {
        return;
    }
    let config = config_from(&data[..3]);
    let payload_size = config.payload_size;

    let medium = SharedMedium::new(InMemoryMedium::empty());
    let mut buffer = match WearLevelBuffer::open(config.clone(), medium.clone()) {
        Ok(buffer) => buffer,
        Err(_) => return,
    };
    let mut model: Option<Vec<u8>> = None;

    let mut offset = 3;
    while offset < data.len() {
        let op = data[offset];
        offset += 1;

        match op % 4 {
            0 => {
                // Put
                let payload: Vec<u8> = (0..payload_size)
                    .map(|i| data.get(offset + i).copied().unwrap_or(0))
                    .collect();
                offset += payload_size;
                buffer
                    .put(&payload)
                    .unwrap_or_else(|e| panic!("put failed: {e}"));
                model = Some(payload);
            }
            1 => {
                let record = buffer.get().unwrap_or_else(|e| panic!("get failed: {e}"));
                assert_eq!(record, model, "get disagrees with last put");
            }
            2 => {
                buffer
                    .fast_format()
                    .unwrap_or_else(|e| panic!("format failed: {e}"));
                model = None;
            }
            _ => {
                // Restart
                buffer = WearLevelBuffer::open(config.clone(), medium.clone())
                    .unwrap_or_else(|e| panic!("restart failed: {e}"));
            }
        }
    }

    assert_eq!(buffer.get().ok().flatten(), model);
}
