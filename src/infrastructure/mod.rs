//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like the audio device, FFmpeg,
//! the classifier service and the filesystem.

pub mod capture;
pub mod classifier;
pub mod config;
pub mod mirror;
pub mod storage;

// Re-export adapters
pub use capture::{select_provider, CpalCapture, FfmpegCapture, PlatformCapture};
pub use classifier::HttpCryClassifier;
pub use config::XdgConfigStore;
pub use mirror::HttpHistoryMirror;
pub use storage::{JsonFileStore, MemoryStore};
