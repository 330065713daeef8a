//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod classifier;
pub mod config;
pub mod mirror;
pub mod storage;

// Re-export common types
pub use capture::{CaptureError, CaptureProvider};
pub use classifier::{ClassifyError, CryClassifier};
pub use config::ConfigStore;
pub use mirror::{HistoryMirror, MirrorError};
pub use storage::{KeyValueStore, StorageError};
