//! Recording domain module

mod artifact;
mod duration;
mod encoding;

pub use artifact::{ArtifactHandle, AudioArtifact};
pub use duration::{
    Duration, DEFAULT_CLASSIFY_TIMEOUT_SECS, DEFAULT_RECORDING_SECS, MAX_RECORDING_SECS,
};
pub use encoding::{AudioContainer, AudioEncoding, CLASSIFIER_SAMPLE_RATE};
