//! Classification result value object

use super::cry_label::CryLabel;
use super::emotion::EmotionVector;

/// What the classifier said about one recording
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    label: CryLabel,
    confidence: f64,
    raw_label: String,
    timestamp: String,
}

impl ClassificationResult {
    /// Build a result from the classifier's fields.
    ///
    /// Returns `None` when `confidence` is not a finite value in `[0, 1]`.
    pub fn new(
        raw_label: impl Into<String>,
        confidence: f64,
        timestamp: impl Into<String>,
    ) -> Option<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return None;
        }
        let raw_label = raw_label.into();
        Some(Self {
            label: CryLabel::from_cry_type(&raw_label),
            confidence,
            raw_label,
            timestamp: timestamp.into(),
        })
    }

    pub fn label(&self) -> CryLabel {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// `cry_type` exactly as received
    pub fn raw_label(&self) -> &str {
        &self.raw_label
    }

    /// Classifier timestamp exactly as received
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn emotions(&self) -> EmotionVector {
        self.label.emotions()
    }

    pub fn recommendation(&self) -> &'static str {
        self.label.recommendation()
    }
}
