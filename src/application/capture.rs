//! Capture controller
//!
//! Drives a [`CaptureProvider`] through the session state machine so that at
//! most one microphone stream is open at a time, whatever the provider.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, warn};

use crate::domain::capture::{CaptureSession, CaptureState};
use crate::domain::recording::{ArtifactHandle, AudioArtifact, AudioEncoding};

use super::ports::{CaptureError, CaptureProvider};

/// Session ids are unique per process so a handle only ever matches the
/// controller that issued it
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Proof of a started session, consumed by [`CaptureController::stop_session`]
#[derive(Debug)]
pub struct SessionHandle {
    id: u64,
    started_at: Instant,
    encoding: AudioEncoding,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Encoding the provider accepted for this session
    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Rolls a session back when dropped while it is still open.
///
/// Once the session has been stopped or aborted the guard does nothing.
#[must_use = "the session is rolled back as soon as the guard is dropped"]
pub struct SessionGuard<'a, P: CaptureProvider> {
    controller: &'a CaptureController<P>,
    id: u64,
}

impl<P: CaptureProvider> Drop for SessionGuard<'_, P> {
    fn drop(&mut self) {
        if self.controller.abandon(self.id) {
            warn!(session = self.id, "capture session dropped while open, stream released");
        }
    }
}

#[derive(Debug)]
struct ActiveSession {
    id: u64,
    started_at: Instant,
}

#[derive(Debug, Default)]
struct ControllerState {
    session: CaptureSession,
    /// Set from a successful open until the stream is released
    active: Option<ActiveSession>,
}

pub struct CaptureController<P: CaptureProvider> {
    provider: P,
    state: Mutex<ControllerState>,
    open_streams: AtomicUsize,
}

impl<P: CaptureProvider> CaptureController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: Mutex::new(ControllerState::default()),
            open_streams: AtomicUsize::new(0),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of microphone streams currently open through this controller
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> CaptureState {
        self.lock().session.state()
    }

    // Never held across an await, so a plain mutex is enough and `Drop` can
    // take it
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Acquire the microphone and start recording.
    ///
    /// Fails fast with [`CaptureError::SessionAlreadyActive`] while another
    /// session is recording or stopping.
    pub async fn start_session(&self) -> Result<SessionHandle, CaptureError> {
        if let Err(e) = self.lock().session.begin() {
            debug!("{}", e);
            return Err(CaptureError::SessionAlreadyActive);
        }

        // Dropped mid-open: the state machine goes back to idle and the
        // provider is told to let go of whatever it managed to open
        let mut pending = PendingStart {
            controller: self,
            armed: true,
        };
        let opened = self.open_stream().await;
        pending.armed = false;

        let encoding = match opened {
            Ok(encoding) => encoding,
            Err(e) => {
                let _ = self.lock().session.abort();
                return Err(e);
            }
        };

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst);
        let started_at = Instant::now();
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        self.lock().active = Some(ActiveSession { id, started_at });

        debug!(
            provider = self.provider.name(),
            session = id,
            %encoding,
            "capture session started"
        );

        Ok(SessionHandle {
            id,
            started_at,
            encoding,
        })
    }

    /// Tie the session behind `handle` to a scope: if the guard is dropped
    /// before the session is stopped or aborted, the stream is released
    pub fn guard(&self, handle: &SessionHandle) -> SessionGuard<'_, P> {
        SessionGuard {
            controller: self,
            id: handle.id,
        }
    }

    async fn open_stream(&self) -> Result<AudioEncoding, CaptureError> {
        self.provider.ensure_permission().await?;

        let preferred = self.provider.preferred_encoding();
        match self.provider.open(preferred).await {
            Ok(()) => Ok(preferred),
            Err(CaptureError::EncodingUnsupported(reason)) => {
                let fallback = self.provider.default_encoding();
                warn!(
                    provider = self.provider.name(),
                    "{} rejected ({}), retrying with {}",
                    preferred,
                    reason,
                    fallback
                );
                self.provider.open(fallback).await?;
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    /// Stop recording and take the finalized artifact.
    ///
    /// The artifact's duration is the wall-clock time between start and stop.
    /// A handle issued by another controller, or one whose session already
    /// ended, is rejected with [`CaptureError::NoActiveSession`].
    pub async fn stop_session(&self, handle: SessionHandle) -> Result<AudioArtifact, CaptureError> {
        let started_at = {
            let mut state = self.lock();
            let started_at = match &state.active {
                Some(active) if active.id == handle.id => active.started_at,
                _ => return Err(CaptureError::NoActiveSession),
            };
            if state.session.begin_stop().is_err() {
                return Err(CaptureError::NoActiveSession);
            }
            started_at
        };
        let elapsed = started_at.elapsed().as_secs_f64();

        let result = self.provider.finish().await;
        if !self.release(handle.id, |session| {
            let _ = session.finish();
        }) {
            // Abandoned while finishing; the audio belongs to nobody
            return Err(CaptureError::NoActiveSession);
        }

        let artifact = match result {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!(session = handle.id, "capture session ended without audio: {}", e);
                return Err(e);
            }
        };

        if let ArtifactHandle::File(path) = artifact.handle() {
            if let Err(e) = tokio::fs::metadata(path).await {
                warn!(session = handle.id, "capture file missing: {}", e);
                return Err(CaptureError::ArtifactUnavailable(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        }

        debug!(session = handle.id, elapsed, handle = %artifact.handle(), "capture session finished");
        Ok(artifact.with_duration(elapsed))
    }

    /// Tear down the active session, if any, discarding its audio.
    /// Returns whether a session was aborted.
    pub async fn abort_session(&self) -> bool {
        let active = {
            let mut state = self.lock();
            let active = state.active.take();
            if active.is_some() {
                let _ = state.session.abort();
                self.open_streams.fetch_sub(1, Ordering::SeqCst);
            }
            active
        };

        match active {
            Some(active) => {
                self.provider.abort().await;
                debug!(session = active.id, "capture session aborted");
                true
            }
            None => false,
        }
    }

    /// Clear the session `id` if it is still the active one, applying
    /// `transition` to the state machine. Exactly one caller wins.
    fn release(&self, id: u64, transition: impl FnOnce(&mut CaptureSession)) -> bool {
        let mut state = self.lock();
        match &state.active {
            Some(active) if active.id == id => {}
            _ => return false,
        }
        state.active = None;
        transition(&mut state.session);
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
        true
    }

    /// Synchronous rollback for a session whose owner went away
    fn abandon(&self, id: u64) -> bool {
        let released = self.release(id, |session| {
            let _ = session.abort();
        });
        if released {
            self.provider.release_now();
        }
        released
    }
}

/// Resets the state machine if `start_session` is dropped while opening
struct PendingStart<'a, P: CaptureProvider> {
    controller: &'a CaptureController<P>,
    armed: bool,
}

impl<P: CaptureProvider> Drop for PendingStart<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.controller.lock().session.abort();
            self.controller.provider.release_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex as StdMutex;

    /// Provider that records calls and can be told to reject encodings
    #[derive(Default)]
    struct ScriptedProvider {
        reject_preferred: bool,
        reject_default: bool,
        deny_permission: bool,
        fail_finish: bool,
        missing_file: bool,
        opened_with: StdMutex<Vec<AudioEncoding>>,
        permission_checks: AtomicUsize,
        aborted: AtomicBool,
        released: AtomicBool,
    }

    #[async_trait]
    impl CaptureProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn ensure_permission(&self) -> Result<(), CaptureError> {
            self.permission_checks.fetch_add(1, Ordering::SeqCst);
            if self.deny_permission {
                return Err(CaptureError::PermissionDenied("denied".into()));
            }
            Ok(())
        }

        fn default_encoding(&self) -> AudioEncoding {
            AudioEncoding::wav_mono(44_100)
        }

        async fn open(&self, encoding: AudioEncoding) -> Result<(), CaptureError> {
            self.opened_with.lock().unwrap().push(encoding);
            let preferred = encoding == self.preferred_encoding();
            if (preferred && self.reject_preferred) || (!preferred && self.reject_default) {
                return Err(CaptureError::EncodingUnsupported(encoding.to_string()));
            }
            Ok(())
        }

        async fn finish(&self) -> Result<AudioArtifact, CaptureError> {
            if self.fail_finish {
                return Err(CaptureError::ArtifactUnavailable("gone".into()));
            }
            if self.missing_file {
                let path = std::env::temp_dir().join("crysense-never-written.webm");
                return Ok(AudioArtifact::from_file(path, AudioEncoding::default(), 0.0));
            }
            Ok(AudioArtifact::in_memory(vec![0; 8], AudioEncoding::default(), 0.0))
        }

        async fn abort(&self) {
            self.aborted.store(true, Ordering::SeqCst);
        }

        fn release_now(&self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn start_and_stop_produces_artifact() {
        let controller = CaptureController::new(ScriptedProvider::default());

        let handle = controller.start_session().await.unwrap();
        assert_eq!(controller.open_streams(), 1);
        assert_eq!(controller.state().await, CaptureState::Recording);
        assert_eq!(handle.encoding(), AudioEncoding::classifier_preferred());

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let artifact = controller.stop_session(handle).await.unwrap();

        assert!(artifact.duration_secs() >= 0.02);
        assert_eq!(controller.open_streams(), 0);
        assert_eq!(controller.state().await, CaptureState::Idle);
    }

    #[tokio::test]
    async fn second_start_is_rejected_without_opening() {
        let controller = CaptureController::new(ScriptedProvider::default());
        let _handle = controller.start_session().await.unwrap();

        let err = controller.start_session().await.unwrap_err();
        assert_eq!(err, CaptureError::SessionAlreadyActive);
        assert_eq!(controller.open_streams(), 1);
        assert_eq!(controller.provider().opened_with.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_preferred_encoding_retries_once_with_default() {
        let controller = CaptureController::new(ScriptedProvider {
            reject_preferred: true,
            ..Default::default()
        });

        let handle = controller.start_session().await.unwrap();
        assert_eq!(handle.encoding(), AudioEncoding::wav_mono(44_100));
        assert_eq!(controller.provider().opened_with.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn both_encodings_rejected_fails_and_returns_to_idle() {
        let controller = CaptureController::new(ScriptedProvider {
            reject_preferred: true,
            reject_default: true,
            ..Default::default()
        });

        let err = controller.start_session().await.unwrap_err();
        assert!(matches!(err, CaptureError::EncodingUnsupported(_)));
        assert_eq!(controller.provider().opened_with.lock().unwrap().len(), 2);
        assert_eq!(controller.open_streams(), 0);
        assert_eq!(controller.state().await, CaptureState::Idle);
    }

    #[tokio::test]
    async fn permission_denied_leaves_controller_usable() {
        let controller = CaptureController::new(ScriptedProvider {
            deny_permission: true,
            ..Default::default()
        });

        for _ in 0..3 {
            let err = controller.start_session().await.unwrap_err();
            assert!(err.needs_user_action());
        }
        assert_eq!(controller.state().await, CaptureState::Idle);
        assert!(controller.provider().opened_with.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_handle_is_rejected() {
        let controller = CaptureController::new(ScriptedProvider::default());
        let first = controller.start_session().await.unwrap();
        let stale = SessionHandle {
            id: first.id() + 100,
            started_at: Instant::now(),
            encoding: AudioEncoding::default(),
        };

        let err = controller.stop_session(stale).await.unwrap_err();
        assert_eq!(err, CaptureError::NoActiveSession);
        assert_eq!(controller.state().await, CaptureState::Recording);

        controller.stop_session(first).await.unwrap();
    }

    #[tokio::test]
    async fn stop_on_idle_controller_rejects_foreign_handle() {
        let a = CaptureController::new(ScriptedProvider::default());
        let b = CaptureController::new(ScriptedProvider::default());
        let handle = a.start_session().await.unwrap();

        let err = b.stop_session(handle).await.unwrap_err();

        assert_eq!(err, CaptureError::NoActiveSession);
        assert_eq!(b.state().await, CaptureState::Idle);
        assert_eq!(b.open_streams(), 0);
        assert_eq!(a.state().await, CaptureState::Recording);
        assert_eq!(a.open_streams(), 1);
    }

    #[tokio::test]
    async fn foreign_handle_does_not_stop_running_session() {
        let a = CaptureController::new(ScriptedProvider::default());
        let b = CaptureController::new(ScriptedProvider::default());
        let from_a = a.start_session().await.unwrap();
        let from_b = b.start_session().await.unwrap();
        assert_ne!(from_a.id(), from_b.id());

        assert_eq!(
            b.stop_session(from_a).await.unwrap_err(),
            CaptureError::NoActiveSession
        );
        assert_eq!(b.state().await, CaptureState::Recording);
        assert!(b.stop_session(from_b).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_guard_releases_open_session() {
        let controller = CaptureController::new(ScriptedProvider::default());
        let handle = controller.start_session().await.unwrap();
        {
            let _guard = controller.guard(&handle);
        }

        assert!(controller.provider().released.load(Ordering::SeqCst));
        assert_eq!(controller.open_streams(), 0);
        assert_eq!(controller.state().await, CaptureState::Idle);
        assert_eq!(
            controller.stop_session(handle).await.unwrap_err(),
            CaptureError::NoActiveSession
        );

        let next = controller.start_session().await.unwrap();
        controller.stop_session(next).await.unwrap();
    }

    #[tokio::test]
    async fn guard_is_inert_after_stop() {
        let controller = CaptureController::new(ScriptedProvider::default());
        let handle = controller.start_session().await.unwrap();
        let guard = controller.guard(&handle);
        controller.stop_session(handle).await.unwrap();

        let next = controller.start_session().await.unwrap();
        drop(guard);

        assert!(!controller.provider().released.load(Ordering::SeqCst));
        assert_eq!(controller.state().await, CaptureState::Recording);
        controller.stop_session(next).await.unwrap();
    }

    #[tokio::test]
    async fn missing_capture_file_is_unavailable() {
        let controller = CaptureController::new(ScriptedProvider {
            missing_file: true,
            ..Default::default()
        });
        let handle = controller.start_session().await.unwrap();

        let err = controller.stop_session(handle).await.unwrap_err();
        assert!(matches!(err, CaptureError::ArtifactUnavailable(_)));
        assert_eq!(controller.open_streams(), 0);
        assert_eq!(controller.state().await, CaptureState::Idle);
    }

    #[tokio::test]
    async fn failed_finish_still_releases_stream() {
        let controller = CaptureController::new(ScriptedProvider {
            fail_finish: true,
            ..Default::default()
        });
        let handle = controller.start_session().await.unwrap();

        let err = controller.stop_session(handle).await.unwrap_err();
        assert!(matches!(err, CaptureError::ArtifactUnavailable(_)));
        assert_eq!(controller.open_streams(), 0);
        assert_eq!(controller.state().await, CaptureState::Idle);
    }

    #[tokio::test]
    async fn abort_tears_down_stream() {
        let controller = CaptureController::new(ScriptedProvider::default());
        assert!(!controller.abort_session().await);

        let _handle = controller.start_session().await.unwrap();
        assert!(controller.abort_session().await);
        assert!(controller.provider().aborted.load(Ordering::SeqCst));
        assert_eq!(controller.open_streams(), 0);
        assert_eq!(controller.state().await, CaptureState::Idle);
    }
}
