//! Application configuration value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::analysis::Locale;
use crate::domain::recording::Duration;

/// Classifier service the app talks to when nothing else is configured
pub const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:5000";

/// Which capture provider to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureBackend {
    /// Probe the runtime and pick the first working provider
    #[default]
    Auto,
    /// In-process capture through the OS audio API
    Native,
    /// Capture through an ffmpeg subprocess
    Ffmpeg,
}

impl CaptureBackend {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Native => "native",
            Self::Ffmpeg => "ffmpeg",
        }
    }
}

impl FromStr for CaptureBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "native" | "cpal" => Ok(Self::Native),
            "ffmpeg" => Ok(Self::Ffmpeg),
            other => Err(format!(
                "unknown capture backend \"{}\" (expected auto, native or ffmpeg)",
                other
            )),
        }
    }
}

impl fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub classifier_url: Option<String>,
    pub timeout: Option<String>,
    pub duration: Option<String>,
    pub backend: Option<String>,
    pub language: Option<String>,
    pub mirror_url: Option<String>,
    pub history: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            classifier_url: Some(DEFAULT_CLASSIFIER_URL.to_string()),
            timeout: Some(Duration::default_timeout().to_string()),
            duration: Some(Duration::default_recording().to_string()),
            backend: Some(CaptureBackend::Auto.to_string()),
            language: Some(Locale::En.to_string()),
            mirror_url: None,
            history: Some(true),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    pub fn merge(self, other: Self) -> Self {
        Self {
            classifier_url: other.classifier_url.or(self.classifier_url),
            timeout: other.timeout.or(self.timeout),
            duration: other.duration.or(self.duration),
            backend: other.backend.or(self.backend),
            language: other.language.or(self.language),
            mirror_url: other.mirror_url.or(self.mirror_url),
            history: other.history.or(self.history),
        }
    }

    pub fn classifier_url_or_default(&self) -> &str {
        self.classifier_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CLASSIFIER_URL)
    }

    pub fn timeout_or_default(&self) -> Duration {
        self.timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_timeout)
    }

    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse::<Duration>().ok())
            .filter(Duration::is_valid_recording_length)
            .unwrap_or_else(Duration::default_recording)
    }

    pub fn backend_or_default(&self) -> CaptureBackend {
        self.backend
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn language_or_default(&self) -> Locale {
        self.language
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Companion backend base URL, if mirroring is enabled
    pub fn mirror_url(&self) -> Option<&str> {
        self.mirror_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn history_or_default(&self) -> bool {
        self.history.unwrap_or(true)
    }
}
