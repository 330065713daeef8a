//! Capture provider port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::{AudioArtifact, AudioEncoding};

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("No audio capture device available: {0}")]
    DeviceUnavailable(String),

    #[error("Audio encoding not supported: {0}")]
    EncodingUnsupported(String),

    #[error("No active capture session")]
    NoActiveSession,

    #[error("Recording could not be read back: {0}")]
    ArtifactUnavailable(String),

    #[error("A capture session is already active")]
    SessionAlreadyActive,
}

impl CaptureError {
    /// Errors the user has to resolve (grant access, plug in a microphone)
    pub fn needs_user_action(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::DeviceUnavailable(_))
    }
}

/// Port for one runtime-specific way of recording the microphone.
///
/// After a successful [`open`](CaptureProvider::open) exactly one stream is
/// live until [`finish`](CaptureProvider::finish),
/// [`abort`](CaptureProvider::abort) or
/// [`release_now`](CaptureProvider::release_now) returns. All of them must
/// tear the stream down even when they fail.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Short name used in logs and `crysense probe`
    fn name(&self) -> &'static str;

    /// Make sure the microphone may be used.
    /// Safe to call repeatedly; a grant is remembered.
    async fn ensure_permission(&self) -> Result<(), CaptureError>;

    /// Encoding tried first
    fn preferred_encoding(&self) -> AudioEncoding {
        AudioEncoding::classifier_preferred()
    }

    /// The runtime's default high-quality preset, tried once when the
    /// preferred encoding is rejected
    fn default_encoding(&self) -> AudioEncoding;

    /// Open the microphone stream with the given encoding
    async fn open(&self, encoding: AudioEncoding) -> Result<(), CaptureError>;

    /// Close the stream and hand over the finalized audio
    async fn finish(&self) -> Result<AudioArtifact, CaptureError>;

    /// Close the stream and discard any audio
    async fn abort(&self);

    /// Release the stream without waiting, discarding any audio.
    ///
    /// Called from `Drop` when a session's owner goes away mid-recording, so
    /// it must not block or need a runtime.
    fn release_now(&self) {}
}
