//! Render engine: owns the output stream and the oscillator state that feeds it.
//!
//! The engine is a small state machine:
//!
//! ```text
//!            start()                 stream built
//! Stopped ───────────▶ Starting ─────────────────▶ Running
//!    ▲                    │                           │
//!    │   backend failure  │                           │ stop()
//!    └────────────────────┴───────────────────────────┘
//! ```
//!
//! While running, the backend's audio thread calls into a [`Renderer`], which
//! takes one [`ControlSnapshot`] per buffer from the shared [`ParameterStore`]
//! and advances the oscillator. The renderer checkpoints its phase after every
//! buffer, so a stop/start cycle resumes the waveform where it left off instead
//! of clicking back to phase zero.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use toneflow_synth::{ControlSnapshot, Oscillator, OscillatorState, ParameterStore};

use crate::Error;
use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
};

/// Lifecycle state of a [`RenderEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No stream is open; nothing is rendered.
    #[default]
    Stopped,
    /// A stream is being built.
    Starting,
    /// The backend is pulling buffers from the renderer.
    Running,
}

/// The backend refused to open an output stream.
///
/// The engine is back in [`EngineState::Stopped`] when this is returned.
#[derive(Debug, thiserror::Error)]
#[error("audio engine failed to start on backend '{backend}'")]
pub struct EngineStartError {
    backend: String,
    #[source]
    source: Error,
}

impl EngineStartError {
    /// Name of the backend that failed.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// The underlying backend error.
    pub fn error(&self) -> &Error {
        &self.source
    }
}

/// Last phase published by the render thread, stored as `f32` bits.
#[derive(Debug, Default)]
struct PhaseCheckpoint(AtomicU32);

impl PhaseCheckpoint {
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, phase: f32) {
        self.0.store(phase.to_bits(), Ordering::Release);
    }
}

/// Fills output buffers from the parameter store.
///
/// This is what runs inside the backend's output callback. Each call reads one
/// snapshot, so a buffer never mixes two parameter updates, then computes one
/// mono sample per frame, scales it by the snapshot's amplitude, and copies it
/// to every channel.
///
/// ## Real-Time Safety
///
/// `render_interleaved` and `render_planar` do not allocate, lock, or log.
pub struct Renderer {
    oscillator: Oscillator,
    state: OscillatorState,
    store: Arc<ParameterStore>,
    channels: usize,
    checkpoint: Arc<PhaseCheckpoint>,
}

impl Renderer {
    /// Create a renderer for `channels` interleaved output channels.
    ///
    /// A channel count of zero is treated as mono.
    pub fn new(
        oscillator: Oscillator,
        state: OscillatorState,
        store: Arc<ParameterStore>,
        channels: u16,
    ) -> Self {
        Self::with_checkpoint(oscillator, state, store, channels, Arc::default())
    }

    fn with_checkpoint(
        oscillator: Oscillator,
        state: OscillatorState,
        store: Arc<ParameterStore>,
        channels: u16,
        checkpoint: Arc<PhaseCheckpoint>,
    ) -> Self {
        Self {
            oscillator,
            state,
            store,
            channels: usize::from(channels.max(1)),
            checkpoint,
        }
    }

    /// Number of interleaved channels written per frame.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Current oscillator state.
    pub fn state(&self) -> &OscillatorState {
        &self.state
    }

    /// Fill an interleaved buffer and return the number of whole frames written.
    ///
    /// Trailing samples that do not make up a whole frame are zeroed.
    pub fn render_interleaved(&mut self, output: &mut [f32]) -> usize {
        let snapshot = self.store.snapshot();
        let mut frames = output.chunks_exact_mut(self.channels);
        let mut written = 0;
        for frame in &mut frames {
            let value =
                self.oscillator.next_sample(&mut self.state, &snapshot) * snapshot.amplitude;
            frame.fill(value);
            written += 1;
        }
        frames.into_remainder().fill(0.0);
        self.checkpoint.store(self.state.phase());
        written
    }

    /// Fill one slice per channel and return the number of frames written.
    ///
    /// The frame count is the length of the shortest slice; anything past it
    /// in a longer slice is left untouched.
    pub fn render_planar(&mut self, channels: &mut [&mut [f32]]) -> usize {
        let snapshot = self.store.snapshot();
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        for i in 0..frames {
            let value =
                self.oscillator.next_sample(&mut self.state, &snapshot) * snapshot.amplitude;
            for channel in channels.iter_mut() {
                channel[i] = value;
            }
        }
        self.checkpoint.store(self.state.phase());
        frames
    }
}

/// Starts and stops audio output for a shared [`ParameterStore`].
///
/// `start` and `stop` are idempotent. Parameter changes made through
/// [`store`](Self::store) take effect at the next buffer boundary whether or
/// not the engine is running.
pub struct RenderEngine {
    backend: Box<dyn AudioBackend>,
    config: BackendStreamConfig,
    store: Arc<ParameterStore>,
    checkpoint: Arc<PhaseCheckpoint>,
    state: EngineState,
    stream: Option<StreamHandle>,
    sample_rate: u32,
}

impl RenderEngine {
    /// Create a stopped engine that will open streams on `backend`.
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: BackendStreamConfig,
        store: Arc<ParameterStore>,
    ) -> Self {
        let sample_rate = backend.actual_sample_rate(&config);
        Self {
            backend,
            config,
            store,
            checkpoint: Arc::default(),
            state: EngineState::Stopped,
            stream: None,
            sample_rate,
        }
    }

    /// Open an output stream and begin rendering.
    ///
    /// Does nothing if already running. The oscillator resumes from the phase
    /// the previous run ended on.
    ///
    /// The backend's actual sample rate must be above the store's maximum
    /// frequency, otherwise the stream is not opened and
    /// [`Error::UnsupportedConfig`] is returned.
    pub fn start(&mut self) -> Result<(), EngineStartError> {
        if self.state == EngineState::Running {
            return Ok(());
        }
        self.state = EngineState::Starting;

        let backend_name = self.backend.name().to_string();
        let sample_rate = self.backend.actual_sample_rate(&self.config);
        let max_frequency = self.store.range().max();
        if sample_rate == 0 || max_frequency >= sample_rate as f32 {
            return Err(self.start_failed(
                backend_name,
                Error::UnsupportedConfig(format!(
                    "sample rate {sample_rate} Hz cannot render up to {max_frequency} Hz"
                )),
            ));
        }

        let mut renderer = Renderer::with_checkpoint(
            Oscillator::new(sample_rate as f32),
            OscillatorState::with_phase(self.checkpoint.load()),
            Arc::clone(&self.store),
            self.config.channels,
            Arc::clone(&self.checkpoint),
        );
        let callback: OutputCallback = Box::new(move |data: &mut [f32]| {
            renderer.render_interleaved(data);
        });

        let error_callback: ErrorCallback = {
            let backend_name = backend_name.clone();
            Box::new(move |message: &str| {
                tracing::error!(
                    backend = %backend_name,
                    error = message,
                    "audio stream error"
                );
            })
        };

        match self
            .backend
            .build_output_stream(&self.config, callback, error_callback)
        {
            Ok(stream) => {
                self.stream = Some(stream);
                self.sample_rate = sample_rate;
                self.state = EngineState::Running;
                tracing::info!(
                    backend = %backend_name,
                    sample_rate,
                    channels = self.config.channels,
                    phase = self.checkpoint.load(),
                    "render engine started"
                );
                Ok(())
            }
            Err(source) => Err(self.start_failed(backend_name, source)),
        }
    }

    fn start_failed(&mut self, backend: String, source: Error) -> EngineStartError {
        self.state = EngineState::Stopped;
        tracing::warn!(
            backend = %backend,
            error = %source,
            "render engine failed to start"
        );
        EngineStartError { backend, source }
    }

    /// Close the output stream.
    ///
    /// Does nothing if not running. No buffer is rendered after this returns.
    pub fn stop(&mut self) {
        if self.state != EngineState::Running {
            return;
        }
        self.stream = None;
        self.state = EngineState::Stopped;
        tracing::info!(phase = self.checkpoint.load(), "render engine stopped");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether a stream is open.
    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    /// The parameter store the renderer reads from.
    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// Current parameter values.
    pub fn snapshot(&self) -> ControlSnapshot {
        self.store.snapshot()
    }

    /// Phase at the end of the most recently rendered buffer.
    pub fn phase(&self) -> f32 {
        self.checkpoint.load()
    }

    /// Rewind the oscillator to phase zero for the next start.
    ///
    /// Only allowed while stopped; returns `false` and changes nothing while a
    /// stream is open.
    pub fn reset_phase(&mut self) -> bool {
        if self.state != EngineState::Stopped {
            return false;
        }
        self.checkpoint.store(0.0);
        tracing::debug!("oscillator phase reset");
        true
    }

    /// Sample rate the backend reported at the last start.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stream configuration used for every start.
    pub fn config(&self) -> &BackendStreamConfig {
        &self.config
    }

    /// Name of the backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("sample_rate", &self.sample_rate)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualBackend;
    use toneflow_synth::{ParamUpdate, WaveformKind};

    fn store_with(freq: f32, amp: f32, kind: WaveformKind) -> Arc<ParameterStore> {
        let store = Arc::new(ParameterStore::default());
        store
            .set(ParamUpdate::new().frequency(freq).amplitude(amp).waveform(kind))
            .unwrap();
        store
    }

    fn engine(backend: &ManualBackend, store: Arc<ParameterStore>) -> RenderEngine {
        RenderEngine::new(
            Box::new(backend.clone()),
            BackendStreamConfig::default(),
            store,
        )
    }

    fn make_renderer(sample_rate: f32, store: Arc<ParameterStore>, channels: u16) -> Renderer {
        Renderer::new(
            Oscillator::new(sample_rate),
            OscillatorState::new(),
            store,
            channels,
        )
    }

    #[test]
    fn test_renderer_copies_sample_to_every_channel() {
        let store = store_with(440.0, 0.5, WaveformKind::Sine);
        let mut renderer = make_renderer(44100.0, store, 2);

        let mut buf = [0.0f32; 8];
        assert_eq!(renderer.render_interleaved(&mut buf), 4);
        for frame in buf.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        let inc = std::f32::consts::TAU * 440.0 / 44100.0;
        assert!((buf[2] - 0.5 * inc.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_renderer_zeroes_partial_frame() {
        let store = store_with(440.0, 1.0, WaveformKind::Square);
        let mut renderer = make_renderer(44100.0, store, 2);

        let mut buf = [9.0f32; 5];
        assert_eq!(renderer.render_interleaved(&mut buf), 2);
        assert_eq!(buf[4], 0.0);
    }

    #[test]
    fn test_renderer_zero_amplitude_is_silent() {
        let store = store_with(440.0, 0.0, WaveformKind::Square);
        let mut renderer = make_renderer(44100.0, store, 1);
        let mut buf = [1.0f32; 64];
        renderer.render_interleaved(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
        assert!(renderer.state().phase() > 0.0);
    }

    #[test]
    fn test_renderer_planar_matches_interleaved() {
        let store = store_with(700.0, 0.8, WaveformKind::Triangle);
        let mut interleaved = make_renderer(48000.0, Arc::clone(&store), 2);
        let mut planar = make_renderer(48000.0, store, 2);

        let mut inter = [0.0f32; 64];
        interleaved.render_interleaved(&mut inter);

        let mut left = [0.0f32; 32];
        let mut right = [0.0f32; 32];
        assert_eq!(planar.render_planar(&mut [&mut left[..], &mut right[..]]), 32);

        for i in 0..32 {
            assert_eq!(inter[2 * i], left[i]);
            assert_eq!(inter[2 * i + 1], right[i]);
        }
    }

    #[test]
    fn test_renderer_planar_uses_shortest_channel() {
        let store = store_with(440.0, 1.0, WaveformKind::Square);
        let mut renderer = make_renderer(44100.0, store, 2);
        let mut left = [7.0f32; 8];
        let mut right = [7.0f32; 4];
        assert_eq!(renderer.render_planar(&mut [&mut left[..], &mut right[..]]), 4);
        assert_eq!(left[4], 7.0);
        assert_eq!(renderer.render_planar(&mut []), 0);
    }

    #[test]
    fn test_zero_channels_renders_mono() {
        let store = store_with(440.0, 1.0, WaveformKind::Square);
        let renderer = make_renderer(44100.0, store, 0);
        assert_eq!(renderer.channels(), 1);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let backend = ManualBackend::new();
        let mut engine = engine(&backend, Arc::new(ParameterStore::default()));
        assert_eq!(engine.state(), EngineState::Stopped);

        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);

        engine.start().unwrap();
        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(backend.streams_built(), 1);

        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
        assert!(!backend.is_streaming());
    }

    #[test]
    fn test_failed_start_returns_to_stopped() {
        let backend = ManualBackend::new();
        backend.fail_streams("device busy");
        let mut engine = engine(&backend, Arc::new(ParameterStore::default()));

        let err = engine.start().unwrap_err();
        assert_eq!(err.backend(), "manual");
        assert!(matches!(err.error(), Error::Stream(reason) if reason == "device busy"));
        assert_eq!(engine.state(), EngineState::Stopped);

        backend.clear_failure();
        engine.start().unwrap();
        assert!(engine.is_running());
    }

    #[test]
    fn test_phase_resumes_after_restart() {
        let backend = ManualBackend::new();
        let store = store_with(440.0, 1.0, WaveformKind::Sine);
        let mut engine = engine(&backend, Arc::clone(&store));

        engine.start().unwrap();
        backend.render_frames(100);
        let phase = engine.phase();
        assert!(phase > 0.0);
        engine.stop();

        engine.start().unwrap();
        let buf = backend.render_frames(1);
        assert!((buf[0] - phase.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_reset_phase_only_when_stopped() {
        let backend = ManualBackend::new();
        let mut engine = engine(&backend, Arc::new(ParameterStore::default()));

        engine.start().unwrap();
        backend.render_frames(10);
        assert!(!engine.reset_phase());
        assert!(engine.phase() > 0.0);

        engine.stop();
        assert!(engine.reset_phase());
        assert_eq!(engine.phase(), 0.0);

        engine.start().unwrap();
        assert_eq!(backend.render_frames(1)[0], 0.0);
    }

    #[test]
    fn test_sample_rate_follows_backend() {
        let backend = ManualBackend::new();
        backend.force_sample_rate(48000);
        let mut engine = engine(&backend, Arc::new(ParameterStore::default()));
        assert_eq!(engine.sample_rate(), 48000);
        engine.start().unwrap();
        assert_eq!(engine.sample_rate(), 48000);
        assert_eq!(engine.backend_name(), "manual");
    }

    #[test]
    fn test_start_rejects_rate_at_or_below_max_frequency() {
        let backend = ManualBackend::new();
        backend.force_sample_rate(1000);
        let mut engine = engine(&backend, store_with(2000.0, 1.0, WaveformKind::Sawtooth));

        let err = engine.start().unwrap_err();
        assert!(matches!(err.error(), Error::UnsupportedConfig(_)));
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(backend.streams_built(), 0);

        backend.force_sample_rate(2000);
        assert!(engine.start().is_err());

        backend.force_sample_rate(44100);
        engine.start().unwrap();
        let buf = backend.render_frames(256);
        assert!(buf.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_start_rejects_zero_sample_rate() {
        let backend = ManualBackend::new();
        backend.force_sample_rate(0);
        let mut engine = engine(&backend, Arc::new(ParameterStore::default()));

        let err = engine.start().unwrap_err();
        assert!(matches!(err.error(), Error::UnsupportedConfig(_)));
        assert!(!engine.is_running());
        assert!(!backend.is_streaming());
    }
}
