//! Result accumulation and finalization
//!
//! Tasks append into a shared [`ResultSet`] while the run is in flight. Once
//! every task has been joined the set is drained by [`ResultSet::finalize`],
//! which is the only transition to the immutable, ordered report.

use std::sync::{Mutex, MutexGuard};

use crate::models::ResultRecord;

/// Append-only, concurrently written collection of report rows
#[derive(Debug, Default)]
pub struct ResultSet {
    records: Mutex<Vec<ResultRecord>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record
    pub fn push(&self, record: ResultRecord) {
        self.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the set and produce the filtered, sorted report.
    ///
    /// Call only after every writer has been joined.
    pub fn finalize(&self, exclude_not_available: bool) -> Vec<ResultRecord> {
        let records = std::mem::take(&mut *self.lock());
        finalize_records(records, exclude_not_available)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ResultRecord>> {
        // A panicking task cannot leave a half-written Vec behind
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Optionally drop "Not Available" rows, then stable-sort by quota name.
///
/// Ordering is byte-wise ascending. Applying this twice yields the same result
/// as applying it once.
pub fn finalize_records(
    mut records: Vec<ResultRecord>,
    exclude_not_available: bool,
) -> Vec<ResultRecord> {
    if exclude_not_available {
        records.retain(ResultRecord::has_usage);
    }
    records.sort_by(|a, b| a.quota_name.as_bytes().cmp(b.quota_name.as_bytes()));
    records
}
