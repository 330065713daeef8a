//! Classifier infrastructure module
//!
//! Talks to the cry classification service over HTTP.

mod http;

pub use http::{HttpCryClassifier, PREDICT_PATH};
