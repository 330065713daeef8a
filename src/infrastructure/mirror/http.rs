//! HTTP history mirror adapter

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::application::ports::{HistoryMirror, MirrorError};
use crate::domain::analysis::{AnalysisRecord, EmotionVector};
use crate::domain::recording::Duration;

/// Route accepting new history entries on the companion backend
pub const MIRROR_PATH: &str = "/api/cryHistory";

// Request type for the companion backend

#[derive(Debug, Serialize)]
struct CryHistoryEntry<'a> {
    emotions: EmotionVector,
    confidence: f64,
    duration: f64,
    recommendation: &'a str,
    language: &'a str,
}

impl<'a> From<&'a AnalysisRecord> for CryHistoryEntry<'a> {
    fn from(record: &'a AnalysisRecord) -> Self {
        Self {
            emotions: record.emotions(),
            confidence: record.confidence(),
            duration: record.duration_seconds(),
            recommendation: record.recommendation(),
            language: record.language().code(),
        }
    }
}

/// Posts each record to the companion backend
pub struct HttpHistoryMirror {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpHistoryMirror {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout.as_std())
            .build()?;

        Ok(Self {
            endpoint: format!("{}{}", base_url.trim().trim_end_matches('/'), MIRROR_PATH),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HistoryMirror for HttpHistoryMirror {
    async fn mirror(&self, record: &AnalysisRecord) -> Result<(), MirrorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CryHistoryEntry::from(record))
            .send()
            .await
            .map_err(|e| MirrorError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Rejected(status.as_u16()));
        }

        debug!(record = %record.id(), "record mirrored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::Locale;

    #[test]
    fn entry_matches_backend_schema() {
        let record = AnalysisRecord::fallback("offline", 2.5, Locale::Bn);
        let json = serde_json::to_value(CryHistoryEntry::from(&record)).unwrap();

        assert_eq!(json["emotions"]["uncomfortable"], 70);
        assert_eq!(json["emotions"]["needsAttention"], 10);
        assert_eq!(json["confidence"], 0.0);
        assert_eq!(json["duration"], 2.5);
        assert_eq!(json["language"], "bn");
        assert!(json["recommendation"].is_string());
    }

    #[test]
    fn endpoint_is_joined() {
        let mirror =
            HttpHistoryMirror::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(mirror.endpoint(), "http://localhost:3000/api/cryHistory");
    }
}
