//! Cry analysis domain module
//!
//! Labels produced by the classifier, the emotion breakdown derived from them,
//! recommendation text and the persisted analysis record.

mod cry_label;
mod emotion;
mod locale;
mod recommendation;
mod record;
mod result;

pub use cry_label::CryLabel;
pub use emotion::{EmotionKind, EmotionVector};
pub use locale::Locale;
pub use recommendation::{FALLBACK_RECOMMENDATION, GENERIC_RECOMMENDATION};
pub use record::{AnalysisRecord, RecordId, RecordSource};
pub use result::ClassificationResult;
