//! Audio encoding value object

use std::fmt;

/// Sample rate the cry classifier's feature extractor loads audio at.
/// Every provider targets this rate for its preferred encoding.
pub const CLASSIFIER_SAMPLE_RATE: u32 = 22_050;

/// Container format of a captured artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioContainer {
    Wav,
    Webm,
}

impl AudioContainer {
    /// MIME type used for the multipart upload
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Webm => "webm",
        }
    }
}

impl fmt::Display for AudioContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

/// Format, sample rate and channel layout of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioEncoding {
    pub container: AudioContainer,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioEncoding {
    /// 16-bit mono WAV at the classifier's rate
    pub const fn classifier_preferred() -> Self {
        Self::wav_mono(CLASSIFIER_SAMPLE_RATE)
    }

    pub const fn wav_mono(sample_rate: u32) -> Self {
        Self {
            container: AudioContainer::Wav,
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    pub const fn webm_mono(sample_rate: u32) -> Self {
        Self {
            container: AudioContainer::Webm,
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    /// File name used for the upload, e.g. `audio.wav`
    pub fn upload_file_name(&self) -> String {
        format!("audio.{}", self.container.extension())
    }
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self::classifier_preferred()
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} Hz, {} ch, {}-bit",
            self.container.extension(),
            self.sample_rate,
            self.channels,
            self.bits_per_sample
        )
    }
}
