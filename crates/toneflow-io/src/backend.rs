//! Where rendered audio goes.
//!
//! A [`RenderEngine`](crate::RenderEngine) owns a `Box<dyn AudioBackend>` and
//! calls [`AudioBackend::build_output_stream`] each time the pointer goes down.
//! The backend gets the render closure and decides who calls it:
//! [`CpalBackend`](crate::CpalBackend) hands it to the sound card's thread,
//! [`ManualBackend`](crate::ManualBackend) waits for the host to pull buffers.
//!
//! Only output streams exist here. The returned [`StreamHandle`] is the whole
//! lifecycle: while the engine holds it the tone plays, and dropping it is how
//! the engine goes silent when the pointer lifts.

use crate::Result;

/// What the engine asks for when it opens a stream.
///
/// Backends treat `sample_rate` and `buffer_size` as requests; the rate that
/// was actually granted comes back through
/// [`AudioBackend::actual_sample_rate`]. Defaults to 44.1 kHz stereo with
/// 512-frame buffers on the default device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Hz.
    pub sample_rate: u32,
    /// Frames per callback, if the device honours it.
    pub buffer_size: u32,
    /// Every channel gets the same mono tone.
    pub channels: u16,
    /// Case-insensitive substring of the device name; `None` for the default.
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 512,
            channels: 2,
            device_name: None,
        }
    }
}

/// An open output stream. Dropping it closes the stream.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Take ownership of whatever keeps a backend's stream open.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Fills one interleaved buffer (`frames * channels` samples).
///
/// Runs on the audio thread, so it must not allocate, block or do I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Receives a description of anything that goes wrong after the stream opened.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Something that can play the engine's output.
///
/// Object safe so the engine can switch between real and manual output at
/// runtime. The callbacks are boxed for the same reason.
pub trait AudioBackend: Send {
    /// Short name used in logs and [`EngineStartError`](crate::EngineStartError).
    fn name(&self) -> &str;

    /// Open a stream that pulls samples from `callback` until the handle is
    /// dropped. `callback` must not run again once the drop has returned.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Rate the device will really run at for `config`. The engine tunes its
    /// oscillator to this, not to the requested rate.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
