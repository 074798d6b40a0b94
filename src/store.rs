//! In-memory record set mirrored to a key/value snapshot.
//!
//! The store is the only owner of recorded expenses. It deduplicates by id,
//! keeps the most recently ingested records first, and rewrites the whole
//! snapshot after every mutation. A failed write is logged and counted; the
//! in-memory set stays authoritative until the next successful write.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{Result, TrackerError};
use crate::logging::OperationTimer;
use crate::models::ExpenseRecord;
use crate::persistence::KeyValueStore;

/// Key used when none is configured
pub const DEFAULT_SNAPSHOT_KEY: &str = "@expenses";

/// The current set of recorded expenses
pub struct RecordStore {
    records: Vec<ExpenseRecord>,
    ids: HashSet<String>,
    backend: Arc<dyn KeyValueStore>,
    key: String,
    write_failures: u64,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("records", &self.records)
            .field("ids", &self.ids)
            .field("key", &self.key)
            .field("write_failures", &self.write_failures)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Empty store writing to `backend` under `key`
    pub fn new(backend: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            records: Vec::new(),
            ids: HashSet::new(),
            backend,
            key: key.to_string(),
            write_failures: 0,
        }
    }

    /// Populate the store from the persisted snapshot.
    ///
    /// A missing snapshot or a failed read yields an empty store. A snapshot
    /// that exists but cannot be parsed is an error.
    pub fn load(backend: Arc<dyn KeyValueStore>, key: &str) -> Result<Self> {
        let timer = OperationTimer::new("load_snapshot");
        let mut store = Self::new(backend, key);

        let blob = match store.backend.get(key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!(key, "No snapshot found, starting empty");
                return Ok(store);
            },
            Err(e) => {
                error!(key, error = %e, "Failed to read snapshot, starting empty");
                return Ok(store);
            },
        };

        let records: Vec<ExpenseRecord> = serde_json::from_slice(&blob).map_err(|source| {
            TrackerError::CorruptSnapshot {
                key: key.to_string(),
                source,
            }
        })?;

        for record in records {
            if store.ids.insert(record.id().to_string()) {
                store.records.push(record);
            } else {
                warn!(id = record.id(), "Dropping duplicate id found in snapshot");
            }
        }

        info!(key, count = store.records.len(), "Loaded expense records");
        timer.finish();
        Ok(store)
    }

    /// Load, optionally recovering from a corrupt snapshot.
    ///
    /// With `reset_on_corrupt` the unreadable blob is copied to
    /// `{key}.corrupt` and the store starts empty; otherwise the parse
    /// error is returned.
    pub fn open(backend: Arc<dyn KeyValueStore>, key: &str, reset_on_corrupt: bool) -> Result<Self> {
        match Self::load(Arc::clone(&backend), key) {
            Err(TrackerError::CorruptSnapshot { key, source }) if reset_on_corrupt => {
                let quarantine = format!("{key}.corrupt");
                warn!(key = %key, quarantine = %quarantine, error = %source, "Snapshot is corrupt, starting empty");
                if let Some(blob) = backend.get(&key)? {
                    backend.set(&quarantine, &blob)?;
                }
                Ok(Self::new(backend, &key))
            },
            other => other,
        }
    }

    /// Insert every candidate whose id is not yet known.
    ///
    /// Accepted records go in front of the existing ones, keeping their
    /// relative order from the batch. Within a batch the first candidate
    /// with a given id wins. Returns exactly the accepted records.
    pub fn merge(&mut self, candidates: Vec<ExpenseRecord>) -> Vec<ExpenseRecord> {
        let mut accepted = Vec::new();
        for candidate in candidates {
            if self.ids.insert(candidate.id().to_string()) {
                accepted.push(candidate);
            } else {
                debug!(id = candidate.id(), "Skipping duplicate record");
            }
        }

        if accepted.is_empty() {
            return accepted;
        }

        let mut records = accepted.clone();
        records.append(&mut self.records);
        self.records = records;

        self.persist();
        accepted
    }

    /// Remove the record with `id`; returns whether one was removed
    pub fn delete(&mut self, id: &str) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.records.retain(|r| r.id() != id);
        self.persist();
        true
    }

    /// Current records, most recently ingested first
    #[must_use]
    pub fn snapshot(&self) -> &[ExpenseRecord] {
        &self.records
    }

    /// Look up one record
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ExpenseRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// True if a record with `id` is stored
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Backend holding the snapshot
    #[must_use]
    pub fn backend(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.backend)
    }

    /// Snapshot writes that failed since the store was opened
    #[must_use]
    pub const fn write_failures(&self) -> u64 {
        self.write_failures
    }

    // Full rewrite of the snapshot; O(records) per mutation.
    fn persist(&mut self) {
        let outcome = serde_json::to_vec(&self.records)
            .map_err(TrackerError::from)
            .and_then(|blob| self.backend.set(&self.key, &blob));

        match outcome {
            Ok(()) => debug!(key = %self.key, count = self.records.len(), "Snapshot written"),
            Err(e) => {
                self.write_failures += 1;
                metrics::counter!("expense_tracker_snapshot_write_failures_total").increment(1);
                error!(key = %self.key, error = %e, "Failed to write snapshot");
            },
        }
    }
}
