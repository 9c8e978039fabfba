//! On-disk record framing for the snapshot log.
//!
//! Record layout:
//!
//! ```text
//! +------------------+
//! | Payload Length   | (u32 LE)
//! +------------------+
//! | Payload          | (JSON-encoded ItemSnapshotRecord)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over the payload bytes)
//! +------------------+
//! ```
//!
//! Every read verifies the checksum. A mismatch or a truncated frame is an
//! explicit corruption error.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crc32fast::Hasher;

use super::errors::{SnapshotStoreError, SnapshotStoreResult};
use crate::model::ItemSnapshotRecord;

/// Computes the CRC32 checksum of a record payload.
pub fn compute_checksum(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Encodes one record into its on-disk frame.
pub fn encode_record(record: &ItemSnapshotRecord) -> SnapshotStoreResult<Vec<u8>> {
    let payload = serde_json::to_vec(record)?;
    let checksum = compute_checksum(&payload);

    let mut frame = Vec::with_capacity(payload.len() + 8);
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&checksum.to_le_bytes());
    Ok(frame)
}

/// Sequential reader over a snapshot log file.
pub struct LogReader {
    reader: BufReader<File>,
    offset: u64,
    file_len: u64,
}

impl LogReader {
    pub fn open(path: &Path) -> SnapshotStoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            SnapshotStoreError::io(format!("Failed to open snapshot log: {}", path.display()), e)
        })?;
        let file_len = file
            .metadata()
            .map_err(|e| SnapshotStoreError::io("Failed to read snapshot log metadata", e))?
            .len();
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            file_len,
        })
    }

    /// Reads the next record, or `None` at a clean end of file.
    ///
    /// A partial frame (truncated length, payload or checksum) and a
    /// checksum mismatch both abort with a corruption error.
    pub fn read_next(&mut self) -> SnapshotStoreResult<Option<ItemSnapshotRecord>> {
        let frame_offset = self.offset;

        // Clean EOF only at an exact frame boundary; trailing bytes that
        // cannot hold a full length prefix are a torn frame.
        if self.offset == self.file_len {
            return Ok(None);
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|_| {
            SnapshotStoreError::corruption(frame_offset, "truncated record length")
        })?;
        let payload_len = u32::from_le_bytes(len_buf) as usize;

        let mut payload = vec![0u8; payload_len];
        self.reader.read_exact(&mut payload).map_err(|_| {
            SnapshotStoreError::corruption(frame_offset, "truncated record payload")
        })?;

        let mut checksum_buf = [0u8; 4];
        self.reader.read_exact(&mut checksum_buf).map_err(|_| {
            SnapshotStoreError::corruption(frame_offset, "truncated record checksum")
        })?;
        let expected = u32::from_le_bytes(checksum_buf);

        if compute_checksum(&payload) != expected {
            return Err(SnapshotStoreError::corruption(
                frame_offset,
                "checksum mismatch",
            ));
        }

        self.offset += (8 + payload_len) as u64;
        let record: ItemSnapshotRecord = serde_json::from_slice(&payload)?;
        Ok(Some(record))
    }
}
