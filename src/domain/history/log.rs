//! Bounded, newest-first log of analysis records

use serde::{Deserialize, Serialize};

use crate::domain::analysis::AnalysisRecord;

/// Maximum number of records kept
pub const HISTORY_CAPACITY: usize = 100;

/// Ordered log, newest record first, never longer than [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CryHistoryLog {
    records: Vec<AnalysisRecord>,
}

impl CryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap records already ordered newest first, dropping any overflow
    pub fn from_records(mut records: Vec<AnalysisRecord>) -> Self {
        records.truncate(HISTORY_CAPACITY);
        Self { records }
    }

    /// Put `record` at the front and evict the oldest entries over capacity
    pub fn prepend(&mut self, record: AnalysisRecord) {
        self.records.insert(0, record);
        self.records.truncate(HISTORY_CAPACITY);
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AnalysisRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest(&self) -> Option<&AnalysisRecord> {
        self.records.first()
    }
}
