//! History sink
//!
//! Persists analysis records as one bounded, newest-first log stored under a
//! single key of a [`KeyValueStore`].

use chrono::{DateTime, TimeZone};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::analysis::AnalysisRecord;
use crate::domain::history::{CryHistoryLog, HistoryInsights};

use super::ports::{KeyValueStore, StorageError};

/// Storage key of the history log
pub const HISTORY_KEY: &str = "cry_history";

pub struct HistorySink<S: KeyValueStore> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> HistorySink<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load(&self) -> Result<CryHistoryLog, StorageError> {
        let Some(value) = self.store.get(HISTORY_KEY).await? else {
            return Ok(CryHistoryLog::new());
        };

        serde_json::from_value::<Vec<AnalysisRecord>>(value)
            .map(CryHistoryLog::from_records)
            .map_err(|e| StorageError::Corrupt {
                key: HISTORY_KEY.to_string(),
                message: e.to_string(),
            })
    }

    /// Insert a record at the head of the log, dropping the oldest entries
    /// beyond capacity.
    ///
    /// Appends are serialized so concurrent callers never lose each other's
    /// records. A corrupt stored log is replaced.
    pub async fn append(&self, record: AnalysisRecord) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut log = match self.load().await {
            Ok(log) => log,
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!("{}; starting a new history log", e);
                CryHistoryLog::new()
            }
            Err(e) => return Err(e),
        };

        let id = record.id();
        log.prepend(record);

        let value = serde_json::to_value(&log).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.store.set(HISTORY_KEY, value).await?;

        debug!(record = %id, entries = log.len(), "history updated");
        Ok(())
    }

    /// All stored records, newest first
    pub async fn list(&self) -> Result<Vec<AnalysisRecord>, StorageError> {
        self.load().await.map(CryHistoryLog::into_records)
    }

    /// Patterns over the most recent records, `None` when nothing has been
    /// classified yet
    pub async fn insights<Tz: TimeZone>(
        &self,
        now: DateTime<Tz>,
    ) -> Result<Option<HistoryInsights>, StorageError> {
        let log = self.load().await?;
        Ok(HistoryInsights::compute(log.records(), now))
    }
}
