//! Record batching by destination.
//!
//! Records arrive interleaved across destinations ("ABABCCAB"); grouping
//! turns them into one batch per normalized destination ("AAA", "BBB",
//! "CC") so each destination is written in one go.

use rowpack_core::{Record, Result};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Records sharing one normalized destination.
///
/// Records keep their input order. Callers must not depend on the order of
/// batches relative to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    key: String,
    records: Vec<Record>,
}

impl RecordBatch {
    /// Create an empty batch for a normalized destination
    pub fn new(key: impl Into<String>) -> Self {
        RecordBatch {
            key: key.into(),
            records: Vec::new(),
        }
    }

    /// Normalized destination shared by every record in the batch
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Records in input order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access to the records
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Append a record
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the batch has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take the records out of the batch
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Normalize a destination for grouping (Unicode upper case).
///
/// Idempotent: normalizing twice gives the same result as once.
pub fn normalize_destination(destination_id: &str) -> String {
    destination_id.to_uppercase()
}

/// Grouping key of a record: its normalized destination
pub fn record_identity(record: &Record) -> String {
    normalize_destination(record.destination_id())
}

/// Group records without rewriting their destinations.
pub fn group_records(records: Vec<Record>) -> Result<Vec<RecordBatch>> {
    group_by_destination(records, false)
}

/// Group records into one batch per normalized destination.
///
/// Batches are created in first-seen key order and records keep their
/// input order within a batch.
///
/// When `normalize` is true, each record's own `destination_id` is
/// overwritten with the normalized form. Callers that need the original
/// casing must copy the records first.
///
/// # Errors
/// Returns `InvalidRecord` if a record has an empty destination.
pub fn group_by_destination(records: Vec<Record>, normalize: bool) -> Result<Vec<RecordBatch>> {
    let total = records.len();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut batches: Vec<RecordBatch> = Vec::new();

    for mut record in records {
        record.validate()?;
        let key = record_identity(&record);
        if normalize && record.destination_id() != key {
            record.set_destination_id(key.as_str())?;
        }
        match index.get(&key) {
            Some(&pos) => batches[pos].push(record),
            None => {
                index.insert(key.clone(), batches.len());
                let mut batch = RecordBatch::new(key);
                batch.push(record);
                batches.push(batch);
            }
        }
    }

    debug!(records = total, batches = batches.len(), normalize, "grouped records by destination");
    Ok(batches)
}

/// Merge batch collections built from independent partitions.
///
/// Batches with equal keys are concatenated in collection order, so if the
/// partitions were contiguous slices of one list, within-batch order equals
/// the original input order.
pub fn merge_batches<I>(collections: I) -> Vec<RecordBatch>
where
    I: IntoIterator<Item = Vec<RecordBatch>>,
{
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut merged: Vec<RecordBatch> = Vec::new();

    for collection in collections {
        for batch in collection {
            match index.get(batch.key()) {
                Some(&pos) => merged[pos].records.extend(batch.records),
                None => {
                    index.insert(batch.key.clone(), merged.len());
                    merged.push(batch);
                }
            }
        }
    }
    merged
}
