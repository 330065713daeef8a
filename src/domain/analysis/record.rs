//! Persisted analysis record

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::emotion::EmotionVector;
use super::locale::Locale;
use super::recommendation::FALLBACK_RECOMMENDATION;
use super::result::ClassificationResult;

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Record identifier derived from creation time in milliseconds.
///
/// Within one process ids are strictly increasing; two records created in
/// the same millisecond get consecutive values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecordId(u64);

impl RecordId {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let previous = LAST_ID
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or(0);
        Self(now_ms.max(previous + 1))
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RecordId {
    type Error = ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Whether a record came from the classifier or was synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Classified,
    Fallback,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified => write!(f, "classified"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// One completed capture-classify cycle.
///
/// Records are values: once created they are only ever copied into the
/// history log, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    id: RecordId,
    timestamp: DateTime<Utc>,
    emotions: EmotionVector,
    confidence: f64,
    duration_seconds: f64,
    recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_label: Option<String>,
    source: RecordSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    #[serde(default)]
    language: Locale,
}

impl AnalysisRecord {
    /// Record for a successful classification
    pub fn classified(result: &ClassificationResult, duration_seconds: f64, language: Locale) -> Self {
        let timestamp = Utc::now();
        Self {
            id: RecordId::generate(timestamp),
            timestamp,
            emotions: result.emotions(),
            confidence: result.confidence(),
            duration_seconds: sanitize_secs(duration_seconds),
            recommendation: result.recommendation().to_string(),
            raw_label: Some(result.raw_label().to_string()),
            source: RecordSource::Classified,
            fallback_reason: None,
            language,
        }
    }

    /// Synthesized demo record used when capture or classification failed
    pub fn fallback(reason: impl Into<String>, duration_seconds: f64, language: Locale) -> Self {
        let timestamp = Utc::now();
        Self {
            id: RecordId::generate(timestamp),
            timestamp,
            emotions: EmotionVector::FALLBACK,
            confidence: 0.0,
            duration_seconds: sanitize_secs(duration_seconds),
            recommendation: FALLBACK_RECOMMENDATION.to_string(),
            raw_label: None,
            source: RecordSource::Fallback,
            fallback_reason: Some(reason.into()),
            language,
        }
    }

    /// Copy of this record stamped with a different creation time
    pub fn with_timestamp<Tz: TimeZone>(self, timestamp: DateTime<Tz>) -> Self {
        let timestamp = timestamp.with_timezone(&Utc);
        Self { timestamp, ..self }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn emotions(&self) -> EmotionVector {
        self.emotions
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn raw_label(&self) -> Option<&str> {
        self.raw_label.as_deref()
    }

    pub fn source(&self) -> RecordSource {
        self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RecordSource::Fallback
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    pub fn language(&self) -> Locale {
        self.language
    }
}

fn sanitize_secs(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.max(0.0)
    } else {
        0.0
    }
}
