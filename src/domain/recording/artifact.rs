//! Audio artifact produced by one capture session

use std::fmt;
use std::path::{Path, PathBuf};

use super::encoding::AudioEncoding;

/// Where the finalized audio lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactHandle {
    /// Encoded audio held in memory
    Memory(Vec<u8>),
    /// Encoded audio in a temporary file owned by the artifact
    File(PathBuf),
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => write!(f, "memory ({} bytes)", bytes.len()),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// A finalized recording.
///
/// The artifact exclusively owns its handle. A file-backed artifact deletes
/// its file when it is released or dropped, so an aborted or cancelled
/// analysis never leaves audio behind on disk.
#[derive(Debug)]
pub struct AudioArtifact {
    handle: ArtifactHandle,
    encoding: AudioEncoding,
    duration_secs: f64,
}

impl AudioArtifact {
    /// Wrap encoded bytes held in memory
    pub fn in_memory(bytes: Vec<u8>, encoding: AudioEncoding, duration_secs: f64) -> Self {
        Self::new(ArtifactHandle::Memory(bytes), encoding, duration_secs)
    }

    /// Take ownership of an encoded file on disk
    pub fn from_file(path: impl Into<PathBuf>, encoding: AudioEncoding, duration_secs: f64) -> Self {
        Self::new(ArtifactHandle::File(path.into()), encoding, duration_secs)
    }

    fn new(handle: ArtifactHandle, encoding: AudioEncoding, duration_secs: f64) -> Self {
        let duration_secs = if duration_secs.is_finite() {
            duration_secs.max(0.0)
        } else {
            0.0
        };
        Self {
            handle,
            encoding,
            duration_secs,
        }
    }

    pub fn handle(&self) -> &ArtifactHandle {
        &self.handle
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    /// Wall-clock length of the session that produced this artifact
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        match &self.handle {
            ArtifactHandle::File(path) => Some(path),
            ArtifactHandle::Memory(_) => None,
        }
    }

    /// Encoded audio, when it is held in memory
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.handle {
            ArtifactHandle::Memory(bytes) => Some(bytes),
            ArtifactHandle::File(_) => None,
        }
    }

    /// Override the wall-clock duration (set by the capture controller)
    pub(crate) fn with_duration(mut self, duration_secs: f64) -> Self {
        if duration_secs.is_finite() {
            self.duration_secs = duration_secs.max(0.0);
        }
        self
    }

    /// Release the artifact and any backing file
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if let ArtifactHandle::File(path) = &self.handle {
            let _ = std::fs::remove_file(path);
        }
    }
}
