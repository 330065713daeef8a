//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod history;
pub mod recording;

// Re-export common types
pub use analysis::{
    AnalysisRecord, ClassificationResult, CryLabel, EmotionVector, Locale, RecordId, RecordSource,
};
pub use capture::{CaptureSession, CaptureState, InvalidStateTransition};
pub use config::AppConfig;
pub use error::*;
pub use history::{CryHistoryLog, HistoryInsights, HISTORY_CAPACITY};
pub use recording::{AudioArtifact, AudioContainer, AudioEncoding, Duration};
