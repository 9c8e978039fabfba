//! Snapshot store: append-only log plus in-memory index.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use super::errors::{SnapshotStoreError, SnapshotStoreResult};
use super::log::{encode_record, LogReader};
use super::COPY_CHUNK_SIZE;
use crate::model::ItemSnapshotRecord;

struct Inner {
    file: File,
    /// Snapshot rows per version id, in append order.
    by_version: HashMap<Uuid, Vec<ItemSnapshotRecord>>,
    /// Existence index for idempotent copy: (version_id, dataset_item_id).
    present: HashSet<(Uuid, Uuid)>,
    row_count: u64,
}

/// The item snapshot store.
///
/// Opens (or creates) `<data_dir>/snapshots/items.dat`, replays every
/// record into the in-memory index and serves reads from memory. Writes go
/// through the append-only log with fsync per chunk.
pub struct SnapshotStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl SnapshotStore {
    /// Opens the snapshot log, creating it (and its parent directory) if
    /// missing. Replay verifies every record checksum; corruption aborts
    /// the open.
    pub fn open(data_dir: &Path) -> SnapshotStoreResult<Self> {
        let dir = data_dir.join("snapshots");
        fs::create_dir_all(&dir).map_err(|e| {
            SnapshotStoreError::io(
                format!("Failed to create snapshot directory: {}", dir.display()),
                e,
            )
        })?;
        let path = dir.join("items.dat");

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                SnapshotStoreError::io(
                    format!("Failed to open snapshot log: {}", path.display()),
                    e,
                )
            })?;

        let mut by_version: HashMap<Uuid, Vec<ItemSnapshotRecord>> = HashMap::new();
        let mut present = HashSet::new();
        let mut row_count = 0u64;

        let len = file
            .metadata()
            .map_err(|e| SnapshotStoreError::io("Failed to read snapshot log metadata", e))?
            .len();
        if len > 0 {
            let mut reader = LogReader::open(&path)?;
            while let Some(record) = reader.read_next()? {
                present.insert((record.dataset_version_id, record.dataset_item_id));
                by_version
                    .entry(record.dataset_version_id)
                    .or_default()
                    .push(record);
                row_count += 1;
            }
        }

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                by_version,
                present,
                row_count,
            }),
        })
    }

    /// Returns the path of the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends snapshot rows for one version, chunked and idempotent.
    ///
    /// Rows whose (version, item) pair is already present are skipped, so a
    /// copy interrupted mid-way can be re-run for the same version id
    /// without duplicating rows. fsync after every chunk bounds the data at
    /// risk without holding the whole item set in flight.
    ///
    /// Returns the number of rows actually appended.
    pub fn copy_rows(&self, rows: Vec<ItemSnapshotRecord>) -> SnapshotStoreResult<usize> {
        let mut inner = self.inner.lock().map_err(|_| SnapshotStoreError::poisoned())?;
        let mut appended = 0usize;

        for chunk in rows.chunks(COPY_CHUNK_SIZE) {
            let mut batch = Vec::new();
            let mut batch_records = Vec::new();
            for record in chunk {
                let key = (record.dataset_version_id, record.dataset_item_id);
                if inner.present.contains(&key) {
                    continue;
                }
                batch.extend_from_slice(&encode_record(record)?);
                batch_records.push(record.clone());
            }
            if batch_records.is_empty() {
                continue;
            }

            inner
                .file
                .write_all(&batch)
                .map_err(|e| SnapshotStoreError::io("Failed to append snapshot rows", e))?;
            inner
                .file
                .sync_all()
                .map_err(|e| SnapshotStoreError::io("fsync failed on snapshot log", e))?;

            // Index only after the chunk is durable.
            for record in batch_records {
                inner
                    .present
                    .insert((record.dataset_version_id, record.dataset_item_id));
                inner
                    .by_version
                    .entry(record.dataset_version_id)
                    .or_default()
                    .push(record);
                inner.row_count += 1;
                appended += 1;
            }
        }

        Ok(appended)
    }

    /// All snapshot rows sealed under one version id.
    pub fn rows_for_version(&self, version_id: Uuid) -> SnapshotStoreResult<Vec<ItemSnapshotRecord>> {
        let inner = self.inner.lock().map_err(|_| SnapshotStoreError::poisoned())?;
        Ok(inner
            .by_version
            .get(&version_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Whether a (version, item) row already exists.
    pub fn has_row(&self, version_id: Uuid, dataset_item_id: Uuid) -> SnapshotStoreResult<bool> {
        let inner = self.inner.lock().map_err(|_| SnapshotStoreError::poisoned())?;
        Ok(inner.present.contains(&(version_id, dataset_item_id)))
    }

    /// Total row count across all versions. Used by the migration
    /// idempotency checks and tests.
    pub fn row_count(&self) -> SnapshotStoreResult<u64> {
        let inner = self.inner.lock().map_err(|_| SnapshotStoreError::poisoned())?;
        Ok(inner.row_count)
    }
}
