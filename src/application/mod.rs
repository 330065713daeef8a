//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod analyze;
pub mod capture;
pub mod history;
pub mod ports;

// Re-export use cases
pub use analyze::{
    AnalysisControl, AnalysisOutput, AnalyzeCallbacks, AnalyzeCryUseCase, AnalyzeError,
    AnalyzeInput,
};
pub use capture::{CaptureController, SessionGuard, SessionHandle};
pub use history::{HistorySink, HISTORY_KEY};
