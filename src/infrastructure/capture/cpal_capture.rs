//! Native microphone capture using cpal
//!
//! The stream lives on a dedicated thread since `cpal::Stream` is not `Send`.
//! Samples are mixed to mono as they arrive and converted to the session
//! encoding when the session finishes.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::wav::{encode_wav, f32_to_i16, mix_to_mono};
use crate::application::ports::{CaptureError, CaptureProvider};
use crate::domain::recording::{AudioArtifact, AudioContainer, AudioEncoding};

/// Rate of the high-quality preset used when the preferred encoding fails
const DEFAULT_PRESET_RATE: u32 = 44_100;

/// How often the capture thread checks for a stop request
const STOP_POLL: std::time::Duration = std::time::Duration::from_millis(20);

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct ActiveStream {
    worker: JoinHandle<()>,
    encoding: AudioEncoding,
}

/// Microphone capture through the platform's native audio API
pub struct CpalCapture {
    /// Captured samples (mono, i16, at device rate)
    buffer: Arc<StdMutex<Vec<i16>>>,
    device_rate: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    active: StdMutex<Option<ActiveStream>>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(StdMutex::new(Vec::new())),
            device_rate: Arc::new(AtomicU32::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            active: StdMutex::new(None),
        }
    }

    /// Whether the default host exposes an input device
    pub fn is_available() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()))
    }

    /// Pick an i16 or f32 input config, preferring fewer channels and a range
    /// that contains `target_rate`
    fn input_config(
        device: &cpal::Device,
        target_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to query configs: {}", e)))?;

        let includes = |range: &cpal::SupportedStreamConfigRange| {
            range.min_sample_rate().0 <= target_rate && range.max_sample_rate().0 >= target_rate
        };

        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for range in configs {
            if !matches!(range.sample_format(), SampleFormat::I16 | SampleFormat::F32) {
                continue;
            }
            let better = match &best {
                None => true,
                Some(current) => {
                    (includes(&range) && !includes(current))
                        || (includes(&range) == includes(current)
                            && range.channels() < current.channels())
                }
            };
            if better {
                best = Some(range);
            }
        }

        let range = best.ok_or_else(|| {
            CaptureError::EncodingUnsupported("device offers no 16-bit or float input".into())
        })?;

        let sample_rate = if includes(&range) {
            cpal::SampleRate(target_rate)
        } else {
            range.max_sample_rate()
        };

        let config = StreamConfig {
            channels: range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((config, range.sample_format()))
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        format: SampleFormat,
        buffer: Arc<StdMutex<Vec<i16>>>,
        running: Arc<AtomicBool>,
    ) -> Result<cpal::Stream, CaptureError> {
        let channels = config.channels;
        let on_error = |err: cpal::StreamError| warn!("audio stream error: {}", err);

        let stream = match format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if running.load(Ordering::SeqCst) {
                        let mono = mix_to_mono(data, channels);
                        lock(&buffer).extend_from_slice(&mono);
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if running.load(Ordering::SeqCst) {
                        let mono = mix_to_mono(&f32_to_i16(data), channels);
                        lock(&buffer).extend_from_slice(&mono);
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::EncodingUnsupported(format!(
                    "sample format {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| match e {
            BuildStreamError::StreamConfigNotSupported => {
                CaptureError::EncodingUnsupported(format!("{} Hz input rejected", config.sample_rate.0))
            }
            BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable(e.to_string()),
            other => CaptureError::PermissionDenied(other.to_string()),
        })
    }

    /// Body of the capture thread: open the stream, report the outcome, then
    /// hold the stream until `running` is cleared
    fn run_stream(
        target_rate: u32,
        buffer: Arc<StdMutex<Vec<i16>>>,
        device_rate: Arc<AtomicU32>,
        running: Arc<AtomicBool>,
        ready: oneshot::Sender<Result<(), CaptureError>>,
    ) {
        let opened = Self::input_device().and_then(|device| {
            let (config, format) = Self::input_config(&device, target_rate)?;
            let stream =
                Self::build_stream(&device, &config, format, buffer, Arc::clone(&running))?;
            stream
                .play()
                .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
            device_rate.store(config.sample_rate.0, Ordering::SeqCst);
            debug!(
                rate = config.sample_rate.0,
                channels = config.channels,
                "cpal input stream started"
            );
            Ok(stream)
        });

        let stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                running.store(false, Ordering::SeqCst);
                let _ = ready.send(Err(e));
                return;
            }
        };

        if ready.send(Ok(())).is_err() {
            running.store(false, Ordering::SeqCst);
        }
        while running.load(Ordering::SeqCst) {
            std::thread::sleep(STOP_POLL);
        }
        drop(stream);
    }

    /// Signal the capture thread to stop and wait for it to release the device
    async fn shutdown(&self) -> Option<AudioEncoding> {
        let active = lock(&self.active).take()?;
        self.running.store(false, Ordering::SeqCst);

        let ActiveStream { worker, encoding } = active;
        if let Err(e) = tokio::task::spawn_blocking(move || worker.join()).await {
            warn!("capture thread did not shut down cleanly: {}", e);
        }
        Some(encoding)
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureProvider for CpalCapture {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn ensure_permission(&self) -> Result<(), CaptureError> {
        // Access problems surface when the stream is built; here we only
        // check that there is something to ask for.
        tokio::task::spawn_blocking(|| Self::input_device().map(|_| ()))
            .await
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
    }

    fn default_encoding(&self) -> AudioEncoding {
        AudioEncoding::wav_mono(DEFAULT_PRESET_RATE)
    }

    async fn open(&self, encoding: AudioEncoding) -> Result<(), CaptureError> {
        if encoding.container != AudioContainer::Wav
            || encoding.channels != 1
            || encoding.bits_per_sample != 16
        {
            return Err(CaptureError::EncodingUnsupported(format!(
                "native capture writes 16-bit mono WAV, not {}",
                encoding
            )));
        }
        if lock(&self.active).is_some() {
            return Err(CaptureError::SessionAlreadyActive);
        }

        lock(&self.buffer).clear();
        self.device_rate.store(0, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = oneshot::channel();
        let buffer = Arc::clone(&self.buffer);
        let device_rate = Arc::clone(&self.device_rate);
        let running = Arc::clone(&self.running);
        let target_rate = encoding.sample_rate;
        let worker = std::thread::Builder::new()
            .name("crysense-capture".into())
            .spawn(move || Self::run_stream(target_rate, buffer, device_rate, running, ready_tx))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::DeviceUnavailable(e.to_string())
            })?;

        let outcome = ready_rx.await.unwrap_or_else(|_| {
            Err(CaptureError::DeviceUnavailable(
                "capture thread exited before the stream opened".into(),
            ))
        });

        match outcome {
            Ok(()) => {
                *lock(&self.active) = Some(ActiveStream { worker, encoding });
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = tokio::task::spawn_blocking(move || worker.join()).await;
                Err(e)
            }
        }
    }

    async fn finish(&self) -> Result<AudioArtifact, CaptureError> {
        let encoding = self.shutdown().await.ok_or(CaptureError::NoActiveSession)?;

        let samples = std::mem::take(&mut *lock(&self.buffer));
        let source_rate = self.device_rate.load(Ordering::SeqCst);
        if source_rate == 0 {
            return Err(CaptureError::ArtifactUnavailable("sample rate not set".into()));
        }

        let (bytes, seconds) =
            tokio::task::spawn_blocking(move || encode_wav(&samples, source_rate, encoding))
                .await
                .map_err(|e| CaptureError::ArtifactUnavailable(format!("encode task error: {}", e)))?
                .map_err(|e| CaptureError::ArtifactUnavailable(e.to_string()))?;

        debug!(bytes = bytes.len(), seconds, "native capture encoded");
        Ok(AudioArtifact::in_memory(bytes, encoding, seconds))
    }

    async fn abort(&self) {
        self.shutdown().await;
        lock(&self.buffer).clear();
    }

    fn release_now(&self) {
        // The capture thread notices within one poll and drops the stream
        self.running.store(false, Ordering::SeqCst);
        if lock(&self.active).take().is_some() {
            debug!("native capture released without finishing");
        }
        lock(&self.buffer).clear();
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
