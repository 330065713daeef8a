//! FFmpeg-based microphone capture
//!
//! Records into a temporary file that the resulting artifact owns.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::ports::{CaptureError, CaptureProvider};
use crate::domain::recording::{AudioArtifact, AudioContainer, AudioEncoding};

/// Rate of the Opus preset used when the preferred encoding fails
const DEFAULT_PRESET_RATE: u32 = 48_000;

/// Time ffmpeg gets to fail on a bad device or encoder before the stream
/// counts as open
const STARTUP_GRACE: std::time::Duration = std::time::Duration::from_millis(300);

#[cfg(target_os = "linux")]
const INPUT_ARGS: [&str; 4] = ["-f", "pulse", "-i", "default"];
#[cfg(target_os = "macos")]
const INPUT_ARGS: [&str; 4] = ["-f", "avfoundation", "-i", ":0"];
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const INPUT_ARGS: [&str; 4] = ["-f", "dshow", "-i", "audio=default"];

struct Recording {
    child: Child,
    path: PathBuf,
    encoding: AudioEncoding,
}

/// Microphone capture through an `ffmpeg` subprocess
pub struct FfmpegCapture {
    recording: Mutex<Option<Recording>>,
    verified: AtomicBool,
}

impl FfmpegCapture {
    pub fn new() -> Self {
        Self {
            recording: Mutex::new(None),
            verified: AtomicBool::new(false),
        }
    }

    /// Whether an `ffmpeg` binary can be run
    pub fn is_available() -> bool {
        std::process::Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn temp_path(encoding: &AudioEncoding) -> PathBuf {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "crysense-{}-{}.{}",
            std::process::id(),
            millis,
            encoding.container.extension()
        ))
    }

    /// Build FFmpeg args for recording
    fn build_args(output_path: &Path, encoding: &AudioEncoding) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostats", "-loglevel", "error"]
            .iter()
            .chain(INPUT_ARGS.iter())
            .map(|s| s.to_string())
            .collect();

        args.extend([
            "-ar".to_string(),
            encoding.sample_rate.to_string(),
            "-ac".to_string(),
            encoding.channels.to_string(),
        ]);

        match encoding.container {
            AudioContainer::Wav => args.extend([
                "-c:a".to_string(),
                format!("pcm_s{}le", encoding.bits_per_sample),
            ]),
            AudioContainer::Webm => args.extend([
                "-c:a".to_string(),
                "libopus".to_string(),
                "-b:a".to_string(),
                "64k".to_string(),
            ]),
        }

        args.push("-y".to_string());
        args.push(output_path.to_string_lossy().to_string());
        args
    }

    /// Classify an early ffmpeg exit from its stderr
    fn startup_error(stderr: &str) -> CaptureError {
        let message = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("ffmpeg exited during startup")
            .to_string();
        let lower = stderr.to_lowercase();

        if lower.contains("unknown encoder")
            || lower.contains("encoder not found")
            || lower.contains("invalid sample format")
            || lower.contains("not supported")
        {
            CaptureError::EncodingUnsupported(message)
        } else if lower.contains("permission denied") || lower.contains("not permitted") {
            CaptureError::PermissionDenied(message)
        } else {
            CaptureError::DeviceUnavailable(message)
        }
    }

    async fn read_stderr(child: &mut Child) -> String {
        let mut buf = Vec::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Ask ffmpeg to finalize the output and exit
    #[cfg(unix)]
    async fn request_stop(child: &mut Child) {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        if let Some(id) = child.id() {
            if let Err(e) = signal::kill(Pid::from_raw(id as i32), Signal::SIGINT) {
                warn!("failed to signal ffmpeg: {}", e);
            }
        }
    }

    #[cfg(not(unix))]
    async fn request_stop(child: &mut Child) {
        use tokio::io::AsyncWriteExt;

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(b"q").await;
        }
    }
}

impl Default for FfmpegCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureProvider for FfmpegCapture {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn ensure_permission(&self) -> Result<(), CaptureError> {
        if self.verified.load(Ordering::SeqCst) {
            return Ok(());
        }

        let available = tokio::task::spawn_blocking(Self::is_available)
            .await
            .unwrap_or(false);
        if !available {
            return Err(CaptureError::DeviceUnavailable(
                "ffmpeg not found. Install it or use the native backend".into(),
            ));
        }

        self.verified.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn default_encoding(&self) -> AudioEncoding {
        AudioEncoding::webm_mono(DEFAULT_PRESET_RATE)
    }

    async fn open(&self, encoding: AudioEncoding) -> Result<(), CaptureError> {
        let mut guard = self.recording.lock().await;
        if guard.is_some() {
            return Err(CaptureError::SessionAlreadyActive);
        }

        let path = Self::temp_path(&encoding);
        let args = Self::build_args(&path, &encoding);
        debug!(?args, "spawning ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::DeviceUnavailable("ffmpeg not found".into())
                } else {
                    CaptureError::DeviceUnavailable(e.to_string())
                }
            })?;

        tokio::time::sleep(STARTUP_GRACE).await;
        if let Ok(Some(status)) = child.try_wait() {
            let stderr = Self::read_stderr(&mut child).await;
            let _ = tokio::fs::remove_file(&path).await;
            debug!(%status, "ffmpeg exited during startup");
            return Err(Self::startup_error(&stderr));
        }

        *guard = Some(Recording {
            child,
            path,
            encoding,
        });
        Ok(())
    }

    async fn finish(&self) -> Result<AudioArtifact, CaptureError> {
        let Recording {
            mut child,
            path,
            encoding,
        } = self
            .recording
            .lock()
            .await
            .take()
            .ok_or(CaptureError::NoActiveSession)?;

        Self::request_stop(&mut child).await;
        let output = child.wait_with_output().await;

        // From here on the artifact owns the file and deletes it on drop
        let artifact = AudioArtifact::from_file(path, encoding, 0.0);

        if let Ok(output) = &output {
            if !output.status.success() {
                debug!(status = %output.status, "ffmpeg exited with non-zero status after stop");
            }
        }

        let size = match artifact.path() {
            Some(path) => tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0),
            None => 0,
        };
        if size == 0 {
            let reason = match output {
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    stderr
                        .lines()
                        .last()
                        .unwrap_or("recording file is empty")
                        .to_string()
                }
                Err(e) => e.to_string(),
            };
            return Err(CaptureError::ArtifactUnavailable(reason));
        }

        Ok(artifact)
    }

    async fn abort(&self) {
        let Some(Recording { mut child, path, .. }) = self.recording.lock().await.take() else {
            return;
        };

        if let Err(e) = child.kill().await {
            warn!("failed to kill ffmpeg: {}", e);
        }
        let _ = tokio::fs::remove_file(&path).await;
    }

    fn release_now(&self) {
        // Held only briefly outside `open`; a session still opening is
        // killed when its child handle drops
        let Ok(mut guard) = self.recording.try_lock() else {
            return;
        };
        if let Some(Recording { mut child, path, .. }) = guard.take() {
            if let Err(e) = child.start_kill() {
                warn!("failed to kill ffmpeg: {}", e);
            }
            let _ = std::fs::remove_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_args_use_pcm() {
        let args = FfmpegCapture::build_args(
            Path::new("/tmp/out.wav"),
            &AudioEncoding::classifier_preferred(),
        );
        let joined = args.join(" ");

        assert!(joined.contains("-ar 22050"));
        assert!(joined.contains("-ac 1"));
        assert!(joined.contains("-c:a pcm_s16le"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.wav"));
    }

    #[test]
    fn webm_args_use_opus() {
        let args = FfmpegCapture::build_args(
            Path::new("/tmp/out.webm"),
            &AudioEncoding::webm_mono(48_000),
        );
        let joined = args.join(" ");

        assert!(joined.contains("-c:a libopus"));
        assert!(joined.contains("-ar 48000"));
    }

    #[test]
    fn temp_path_uses_container_extension() {
        let path = FfmpegCapture::temp_path(&AudioEncoding::webm_mono(48_000));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("webm"));
    }

    #[test]
    fn startup_errors_are_classified() {
        assert!(matches!(
            FfmpegCapture::startup_error("Unknown encoder 'libopus'"),
            CaptureError::EncodingUnsupported(_)
        ));
        assert!(matches!(
            FfmpegCapture::startup_error("default: Permission denied"),
            CaptureError::PermissionDenied(_)
        ));
        assert!(matches!(
            FfmpegCapture::startup_error("default: No such device"),
            CaptureError::DeviceUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn finish_without_open_reports_no_session() {
        let capture = FfmpegCapture::new();
        assert_eq!(
            capture.finish().await.unwrap_err(),
            CaptureError::NoActiveSession
        );
    }
}
