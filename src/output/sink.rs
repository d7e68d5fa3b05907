//! Record sink: the accumulated, de-duplicated record set of one run

use crate::record::BookRecord;
use crate::url::url_key;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use url::Url;

#[derive(Debug, Default)]
struct SinkState {
    records: Vec<BookRecord>,
    keys: HashSet<String>,
}

/// Collects records from concurrent workers, unique by source URL
///
/// URLs are compared by the same normalized key the frontier uses. Detail
/// pages are never dispatched twice, so a repeated key only shows up when two
/// URLs redirect to the same page.
#[derive(Debug, Default)]
pub struct RecordSink {
    state: Mutex<SinkState>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a record unless its URL is already present
    ///
    /// # Returns
    ///
    /// * `true` - The record was accepted
    /// * `false` - A record with the same URL was accepted earlier
    pub fn accept(&self, record: BookRecord) -> bool {
        let key = record_key(&record);
        let mut state = self.lock();
        if !state.keys.insert(key) {
            return false;
        }
        state.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the accepted records in acceptance order
    pub fn finalize(self) -> Vec<BookRecord> {
        self.state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .records
    }

    /// Copies the accepted records out without consuming the sink
    pub fn snapshot(&self) -> Vec<BookRecord> {
        self.lock().records.clone()
    }
}

/// Identity key of a record; the raw URL when it does not parse
fn record_key(record: &BookRecord) -> String {
    Url::parse(record.key())
        .map(|url| url_key(&url))
        .unwrap_or_else(|_| record.key().to_string())
}
