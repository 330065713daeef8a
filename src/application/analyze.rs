//! Analyze cry use case
//!
//! Records one cry, classifies it and stores the outcome. Capture and
//! classification failures never reach the caller: they are absorbed into a
//! clearly-flagged demo record.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::analysis::{AnalysisRecord, Locale};
use crate::domain::recording::{AudioArtifact, AudioEncoding, Duration};

use super::capture::CaptureController;
use super::history::HistorySink;
use super::ports::{
    CaptureError, CaptureProvider, CryClassifier, HistoryMirror, KeyValueStore,
};

/// Interval between progress callbacks while recording
const PROGRESS_TICK: std::time::Duration = std::time::Duration::from_millis(100);

/// Errors from the analyze use case
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("Analysis cancelled")]
    Cancelled,
}

/// Input parameters for the analyze use case
#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    /// Maximum recording length; stop-early may end it sooner
    pub max_duration: Duration,
    /// Locale stamped on the record
    pub language: Locale,
}

impl Default for AnalyzeInput {
    fn default() -> Self {
        Self {
            max_duration: Duration::default_recording(),
            language: Locale::default(),
        }
    }
}

/// Output from the analyze use case
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// The classified or demo record
    pub record: AnalysisRecord,
    /// Set when the microphone could not be used and the user has to act
    pub capture_blocked: Option<CaptureError>,
    /// Whether the record made it into the history log
    pub history_saved: bool,
}

/// Progress callback type: (elapsed_ms, total_ms)
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Callbacks for progress and status updates
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct AnalyzeCallbacks {
    /// Called during recording with (elapsed_ms, total_ms)
    pub on_progress: Option<ProgressCallback>,
    /// Called once the microphone is open
    pub on_recording_start: Option<Box<dyn Fn(AudioEncoding) + Send + Sync>>,
    /// Called when recording ends with the recorded seconds
    pub on_recording_end: Option<Box<dyn Fn(f64) + Send + Sync>>,
    /// Called before the upload starts
    pub on_classifying_start: Option<Box<dyn Fn() + Send + Sync>>,
    /// Called when a demo record replaces the real result
    pub on_fallback: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

/// One-shot latch that can be awaited after it has fired
#[derive(Default)]
struct Latch {
    fired: AtomicBool,
    notify: Notify,
}

impl Latch {
    fn fire(&self) {
        self.fired.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }

    async fn fired(&self) {
        loop {
            // Registered before the flag check so a concurrent fire is not missed
            let notified = self.notify.notified();
            if self.is_fired() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Default)]
struct ControlState {
    stop: Latch,
    cancel: Latch,
}

/// Handle for ending a running analysis from another task (signal handlers)
#[derive(Clone, Default)]
pub struct AnalysisControl {
    state: Arc<ControlState>,
}

impl AnalysisControl {
    /// End the recording phase now and classify what was captured
    pub fn stop_early(&self) {
        self.state.stop.fire();
    }

    /// Abandon the analysis: nothing is classified or stored
    pub fn cancel(&self) {
        self.state.cancel.fire();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.state.stop.is_fired()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancel.is_fired()
    }

    fn reset(&self) {
        self.state.stop.reset();
        self.state.cancel.reset();
    }

    async fn stop_requested(&self) {
        self.state.stop.fired().await
    }

    async fn cancel_requested(&self) {
        self.state.cancel.fired().await
    }
}

/// Record-and-classify use case
pub struct AnalyzeCryUseCase<P, C, S>
where
    P: CaptureProvider,
    C: CryClassifier,
    S: KeyValueStore,
{
    capture: CaptureController<P>,
    classifier: C,
    history: HistorySink<S>,
    record_history: bool,
    mirror: Option<Arc<dyn HistoryMirror>>,
    mirror_tasks: StdMutex<Vec<JoinHandle<()>>>,
    control: AnalysisControl,
}

impl<P, C, S> AnalyzeCryUseCase<P, C, S>
where
    P: CaptureProvider,
    C: CryClassifier,
    S: KeyValueStore,
{
    /// Create a new use case instance
    pub fn new(provider: P, classifier: C, store: S) -> Self {
        Self {
            capture: CaptureController::new(provider),
            classifier,
            history: HistorySink::new(store),
            record_history: true,
            mirror: None,
            mirror_tasks: StdMutex::new(Vec::new()),
            control: AnalysisControl::default(),
        }
    }

    /// Also post every record to a remote history
    pub fn with_mirror(mut self, mirror: Arc<dyn HistoryMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Keep records out of the local history log
    pub fn without_history(mut self) -> Self {
        self.record_history = false;
        self
    }

    /// Get the control handle for external signal handling
    pub fn control(&self) -> AnalysisControl {
        self.control.clone()
    }

    pub fn capture(&self) -> &CaptureController<P> {
        &self.capture
    }

    pub fn history(&self) -> &HistorySink<S> {
        &self.history
    }

    /// Record, classify and store one cry.
    ///
    /// Always yields a record unless the caller cancels.
    pub async fn record_and_classify(
        &self,
        input: AnalyzeInput,
        callbacks: AnalyzeCallbacks,
    ) -> Result<AnalysisOutput, AnalyzeError> {
        self.control.reset();

        let mut capture_blocked = None;
        let record = match self.capture.start_session().await {
            Ok(handle) => {
                // Releases the microphone if this future is dropped before
                // the session ends
                let _session = self.capture.guard(&handle);
                let started = Instant::now();
                if let Some(ref cb) = callbacks.on_recording_start {
                    cb(handle.encoding());
                }

                self.wait_for_recording_end(input.max_duration, &callbacks)
                    .await?;

                match self.capture.stop_session(handle).await {
                    Ok(artifact) => {
                        if let Some(ref cb) = callbacks.on_recording_end {
                            cb(artifact.duration_secs());
                        }
                        self.classify(artifact, input.language, &callbacks).await?
                    }
                    Err(e) => {
                        let elapsed = started.elapsed().as_secs_f64();
                        self.fallback(e.to_string(), elapsed, input.language, &callbacks)
                    }
                }
            }
            Err(e) => {
                if e.needs_user_action() {
                    capture_blocked = Some(e.clone());
                }
                self.fallback(e.to_string(), 0.0, input.language, &callbacks)
            }
        };

        let history_saved = self.store(&record).await;

        Ok(AnalysisOutput {
            record,
            capture_blocked,
            history_saved,
        })
    }

    async fn wait_for_recording_end(
        &self,
        max_duration: Duration,
        callbacks: &AnalyzeCallbacks,
    ) -> Result<(), AnalyzeError> {
        let total_ms = max_duration.as_millis();
        let started = tokio::time::Instant::now();
        let deadline = started + max_duration.as_std();
        let mut ticker = tokio::time::interval(PROGRESS_TICK);

        loop {
            tokio::select! {
                biased;

                _ = self.control.cancel_requested() => {
                    self.capture.abort_session().await;
                    info!("analysis cancelled while recording");
                    return Err(AnalyzeError::Cancelled);
                }
                _ = self.control.stop_requested() => {
                    debug!("recording stopped early");
                    return Ok(());
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Some(ref cb) = callbacks.on_progress {
                        let elapsed = started.elapsed().as_millis() as u64;
                        cb(elapsed.min(total_ms), total_ms);
                    }
                }
            }
        }
    }

    async fn classify(
        &self,
        artifact: AudioArtifact,
        language: Locale,
        callbacks: &AnalyzeCallbacks,
    ) -> Result<AnalysisRecord, AnalyzeError> {
        if let Some(ref cb) = callbacks.on_classifying_start {
            cb();
        }

        let duration = artifact.duration_secs();
        let outcome = tokio::select! {
            biased;

            _ = self.control.cancel_requested() => None,
            result = self.classifier.classify(&artifact) => Some(result),
        };
        artifact.release();

        match outcome {
            None => {
                info!("analysis cancelled while classifying");
                Err(AnalyzeError::Cancelled)
            }
            Some(Ok(result)) => {
                info!(
                    label = %result.label(),
                    confidence = result.confidence(),
                    duration,
                    "cry classified"
                );
                Ok(AnalysisRecord::classified(&result, duration, language))
            }
            Some(Err(e)) => Ok(self.fallback(e.to_string(), duration, language, callbacks)),
        }
    }

    fn fallback(
        &self,
        reason: String,
        duration: f64,
        language: Locale,
        callbacks: &AnalyzeCallbacks,
    ) -> AnalysisRecord {
        warn!("using demo result: {}", reason);
        if let Some(ref cb) = callbacks.on_fallback {
            cb(&reason);
        }
        AnalysisRecord::fallback(reason, duration, language)
    }

    /// Give pending mirror uploads up to `limit` to finish, so a short-lived
    /// process does not drop them on exit
    pub async fn wait_for_mirror(&self, limit: std::time::Duration) {
        let tasks: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self
                .mirror_tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        if tasks.is_empty() {
            return;
        }

        let all = async {
            for task in tasks {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(limit, all).await.is_err() {
            debug!("mirror uploads still pending at exit");
        }
    }

    /// Persist and mirror a finished record. Failures are logged only.
    async fn store(&self, record: &AnalysisRecord) -> bool {
        if let Some(mirror) = &self.mirror {
            let mirror = Arc::clone(mirror);
            let record = record.clone();
            let task = tokio::spawn(async move {
                if let Err(e) = mirror.mirror(&record).await {
                    warn!("history mirror failed: {}", e);
                }
            });
            self.mirror_tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(task);
        }

        if !self.record_history {
            return false;
        }

        match self.history.append(record.clone()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to save analysis to history: {}", e);
                false
            }
        }
    }
}
