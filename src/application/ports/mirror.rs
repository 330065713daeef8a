//! Remote history mirror port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::analysis::AnalysisRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("Mirror request failed: {0}")]
    Request(String),

    #[error("Mirror rejected the record with HTTP {0}")]
    Rejected(u16),
}

/// Port for copying records to the companion backend
#[async_trait]
pub trait HistoryMirror: Send + Sync {
    async fn mirror(&self, record: &AnalysisRecord) -> Result<(), MirrorError>;
}
