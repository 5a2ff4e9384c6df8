//! Host-driven backend.
//!
//! [`ManualBackend`] never touches an audio device. Building a stream parks the
//! engine's callback in a shared slot, and the host pulls audio by calling
//! [`ManualBackend::render`]. Dropping the stream handle empties the slot, so a
//! render after `stop()` produces silence exactly like a closed device.
//!
//! The backend is cheaply cloneable; every clone shares the same slot. Hand one
//! clone to the engine and keep another to drive it:
//!
//! ```rust
//! use std::sync::Arc;
//! use toneflow_io::{BackendStreamConfig, ManualBackend, RenderEngine};
//! use toneflow_synth::ParameterStore;
//!
//! let backend = ManualBackend::new();
//! let mut engine = RenderEngine::new(
//!     Box::new(backend.clone()),
//!     BackendStreamConfig::default(),
//!     Arc::new(ParameterStore::default()),
//! );
//!
//! engine.start().unwrap();
//! let mut buffer = vec![0.0f32; 512 * 2];
//! assert!(backend.render(&mut buffer));
//!
//! engine.stop();
//! assert!(!backend.render(&mut buffer));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
};
use crate::{Error, Result};

struct ActiveStream {
    id: u64,
    channels: u16,
    callback: OutputCallback,
    error_callback: ErrorCallback,
}

#[derive(Default)]
struct Shared {
    active: Mutex<Option<ActiveStream>>,
    failure: Mutex<Option<String>>,
    sample_rate: Mutex<Option<u32>>,
    streams_built: AtomicU64,
}

/// Backend whose streams are driven by explicit [`render`](Self::render) calls.
#[derive(Clone, Default)]
pub struct ManualBackend {
    shared: Arc<Shared>,
}

impl ManualBackend {
    /// Create a backend with no active stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `build_output_stream` fail with `reason`,
    /// as a busy or unplugged device would.
    pub fn fail_streams(&self, reason: impl Into<String>) {
        *self.shared.failure.lock() = Some(reason.into());
    }

    /// Undo [`fail_streams`](Self::fail_streams).
    pub fn clear_failure(&self) {
        *self.shared.failure.lock() = None;
    }

    /// Report `rate` as the device rate regardless of what the config requests.
    pub fn force_sample_rate(&self, rate: u32) {
        *self.shared.sample_rate.lock() = Some(rate);
    }

    /// Whether a stream is currently open.
    pub fn is_streaming(&self) -> bool {
        self.shared.active.lock().is_some()
    }

    /// Channel count of the open stream, if any.
    pub fn channels(&self) -> Option<u16> {
        self.shared.active.lock().as_ref().map(|s| s.channels)
    }

    /// Number of streams successfully built over the backend's lifetime.
    pub fn streams_built(&self) -> u64 {
        self.shared.streams_built.load(Ordering::Relaxed)
    }

    /// Pull one interleaved buffer from the open stream.
    ///
    /// Returns `false` and fills `output` with silence when no stream is open.
    pub fn render(&self, output: &mut [f32]) -> bool {
        let mut active = self.shared.active.lock();
        match active.as_mut() {
            Some(stream) => {
                (stream.callback)(output);
                true
            }
            None => {
                output.fill(0.0);
                false
            }
        }
    }

    /// Allocate and render `frames` frames at the open stream's channel count.
    ///
    /// Returns an empty vector when no stream is open.
    pub fn render_frames(&self, frames: usize) -> Vec<f32> {
        let Some(channels) = self.channels() else {
            return Vec::new();
        };
        let mut buffer = vec![0.0; frames * usize::from(channels)];
        self.render(&mut buffer);
        buffer
    }

    /// Deliver a runtime error to the open stream's error callback.
    ///
    /// Returns `false` when no stream is open.
    pub fn report_error(&self, message: &str) -> bool {
        let mut active = self.shared.active.lock();
        match active.as_mut() {
            Some(stream) => {
                (stream.error_callback)(message);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ManualBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualBackend")
            .field("streaming", &self.is_streaming())
            .field("streams_built", &self.streams_built())
            .finish_non_exhaustive()
    }
}

/// Clears the shared slot when the engine drops its handle.
struct ManualStream {
    shared: Arc<Shared>,
    id: u64,
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        let mut active = self.shared.active.lock();
        if active.as_ref().is_some_and(|s| s.id == self.id) {
            *active = None;
        }
    }
}

impl AudioBackend for ManualBackend {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        if let Some(reason) = self.shared.failure.lock().clone() {
            return Err(Error::Stream(reason));
        }
        if config.channels == 0 {
            return Err(Error::UnsupportedConfig(
                "output stream needs at least one channel".into(),
            ));
        }

        let id = self.shared.streams_built.fetch_add(1, Ordering::Relaxed) + 1;
        *self.shared.active.lock() = Some(ActiveStream {
            id,
            channels: config.channels,
            callback,
            error_callback,
        });
        tracing::debug!(id, channels = config.channels, "manual stream opened");

        Ok(StreamHandle::new(ManualStream {
            shared: Arc::clone(&self.shared),
            id,
        }))
    }

    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        self.shared.sample_rate.lock().unwrap_or(config.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> OutputCallback {
        let counter = Arc::clone(counter);
        Box::new(move |buf: &mut [f32]| {
            counter.fetch_add(1, Ordering::Relaxed);
            buf.fill(0.25);
        })
    }

    #[test]
    fn test_render_without_stream_is_silent() {
        let backend = ManualBackend::new();
        let mut buf = [1.0f32; 8];
        assert!(!backend.render(&mut buf));
        assert!(buf.iter().all(|&s| s == 0.0));
        assert!(backend.render_frames(4).is_empty());
    }

    #[test]
    fn test_render_invokes_callback_until_handle_dropped() {
        let backend = ManualBackend::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = backend
            .build_output_stream(
                &BackendStreamConfig::default(),
                counting_callback(&calls),
                Box::new(|_| {}),
            )
            .unwrap();

        assert!(backend.is_streaming());
        assert_eq!(backend.channels(), Some(2));
        let buf = backend.render_frames(3);
        assert_eq!(buf, vec![0.25; 6]);
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        drop(handle);
        assert!(!backend.is_streaming());
        let mut buf = [0.5f32; 4];
        assert!(!backend.render(&mut buf));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_stale_handle_does_not_close_newer_stream() {
        let backend = ManualBackend::new();
        let config = BackendStreamConfig::default();
        let first = backend
            .build_output_stream(&config, Box::new(|_| {}), Box::new(|_| {}))
            .unwrap();
        let _second = backend
            .build_output_stream(&config, Box::new(|_| {}), Box::new(|_| {}))
            .unwrap();

        drop(first);
        assert!(backend.is_streaming());
        assert_eq!(backend.streams_built(), 2);
    }

    #[test]
    fn test_failure_mode() {
        let backend = ManualBackend::new();
        backend.fail_streams("device busy");
        let err = backend
            .build_output_stream(
                &BackendStreamConfig::default(),
                Box::new(|_| {}),
                Box::new(|_| {}),
            )
            .unwrap_err();
        assert!(err.to_string().contains("device busy"));
        assert_eq!(backend.streams_built(), 0);

        backend.clear_failure();
        assert!(
            backend
                .build_output_stream(
                    &BackendStreamConfig::default(),
                    Box::new(|_| {}),
                    Box::new(|_| {}),
                )
                .is_ok()
        );
    }

    #[test]
    fn test_report_error_reaches_callback() {
        let backend = ManualBackend::new();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let _handle = backend
            .build_output_stream(
                &BackendStreamConfig::default(),
                Box::new(|_| {}),
                Box::new(move |msg| sink.lock().push_str(msg)),
            )
            .unwrap();

        assert!(backend.report_error("underrun"));
        assert_eq!(seen.lock().as_str(), "underrun");
    }

    #[test]
    fn test_forced_sample_rate() {
        let backend = ManualBackend::new();
        let config = BackendStreamConfig::default();
        assert_eq!(backend.actual_sample_rate(&config), 44100);
        backend.force_sample_rate(48000);
        assert_eq!(backend.actual_sample_rate(&config), 48000);
    }
}
