//! Configuration domain module

mod app_config;

pub use app_config::{AppConfig, CaptureBackend, DEFAULT_CLASSIFIER_URL};
