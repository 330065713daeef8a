//! Capture infrastructure module
//!
//! Provides microphone capture using cpal (native) or FFmpeg (fallback), and
//! picks one of them by probing the runtime.

mod cpal_capture;
mod ffmpeg_capture;
mod wav;

use async_trait::async_trait;
use tracing::debug;

pub use cpal_capture::CpalCapture;
pub use ffmpeg_capture::FfmpegCapture;
pub use wav::{encode_wav, mix_to_mono, resample, PcmError};

use crate::application::ports::{CaptureError, CaptureProvider};
use crate::domain::config::CaptureBackend;
use crate::domain::recording::{AudioArtifact, AudioEncoding};

/// The capture provider chosen for this runtime
pub enum PlatformCapture {
    Native(CpalCapture),
    Ffmpeg(FfmpegCapture),
}

impl PlatformCapture {
    fn inner(&self) -> &dyn CaptureProvider {
        match self {
            Self::Native(capture) => capture,
            Self::Ffmpeg(capture) => capture,
        }
    }
}

#[async_trait]
impl CaptureProvider for PlatformCapture {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    async fn ensure_permission(&self) -> Result<(), CaptureError> {
        self.inner().ensure_permission().await
    }

    fn preferred_encoding(&self) -> AudioEncoding {
        self.inner().preferred_encoding()
    }

    fn default_encoding(&self) -> AudioEncoding {
        self.inner().default_encoding()
    }

    async fn open(&self, encoding: AudioEncoding) -> Result<(), CaptureError> {
        self.inner().open(encoding).await
    }

    async fn finish(&self) -> Result<AudioArtifact, CaptureError> {
        self.inner().finish().await
    }

    async fn abort(&self) {
        self.inner().abort().await
    }

    fn release_now(&self) {
        self.inner().release_now()
    }
}

/// Pick the capture provider for the configured backend.
///
/// `Auto` prefers native capture when an input device is visible and falls
/// back to ffmpeg when it is installed. With nothing usable the native
/// provider is returned so the session fails with a device error.
pub fn select_provider(backend: CaptureBackend) -> PlatformCapture {
    let selected = match backend {
        CaptureBackend::Native => PlatformCapture::Native(CpalCapture::new()),
        CaptureBackend::Ffmpeg => PlatformCapture::Ffmpeg(FfmpegCapture::new()),
        CaptureBackend::Auto => {
            if CpalCapture::is_available() {
                PlatformCapture::Native(CpalCapture::new())
            } else if FfmpegCapture::is_available() {
                PlatformCapture::Ffmpeg(FfmpegCapture::new())
            } else {
                PlatformCapture::Native(CpalCapture::new())
            }
        }
    };
    debug!(%backend, provider = selected.name(), "capture provider selected");
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_backends_are_honored() {
        assert_eq!(select_provider(CaptureBackend::Native).name(), "native");
        assert_eq!(select_provider(CaptureBackend::Ffmpeg).name(), "ffmpeg");
    }

    #[test]
    fn providers_share_preferred_encoding() {
        let native = select_provider(CaptureBackend::Native);
        let ffmpeg = select_provider(CaptureBackend::Ffmpeg);
        assert_eq!(native.preferred_encoding(), ffmpeg.preferred_encoding());
        assert_ne!(native.default_encoding(), ffmpeg.default_encoding());
    }
}
