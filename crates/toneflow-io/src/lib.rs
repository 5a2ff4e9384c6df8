//! Audio output layer for the toneflow touch tone generator.
//!
//! This crate provides:
//!
//! - **Backends**: the [`AudioBackend`] trait, with [`CpalBackend`] for real
//!   devices and [`ManualBackend`] for host-driven rendering
//! - **Rendering**: [`RenderEngine`], which owns the stream lifecycle, and the
//!   real-time [`Renderer`] that runs inside the audio callback
//! - **Control**: [`ToneSurface`], the pointer-driven facade a UI talks to
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toneflow_io::{BackendStreamConfig, CpalBackend, RenderEngine, ToneSurface};
//! use toneflow_synth::{ParameterStore, PreviewRenderer, WaveformKind};
//!
//! let engine = RenderEngine::new(
//!     Box::new(CpalBackend::new()),
//!     BackendStreamConfig::default(),
//!     Arc::new(ParameterStore::default()),
//! );
//! let mut surface = ToneSurface::new(engine, PreviewRenderer::default());
//!
//! surface.set_waveform(WaveformKind::Triangle);
//! surface.pointer_moved(0.3, 0.8)?; // starts the tone
//! let trace = surface.preview(100);
//! surface.pointer_released(); // stops it
//! ```

pub mod backend;
pub mod cpal_backend;
mod engine;
pub mod manual_backend;
mod surface;

pub use backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
};
pub use cpal_backend::CpalBackend;
pub use engine::{EngineStartError, EngineState, RenderEngine, Renderer};
pub use manual_backend::ManualBackend;
pub use surface::{ControlError, ToneSurface};

/// Error types for audio output operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The stream configuration cannot be opened.
    #[error("Unsupported stream configuration: {0}")]
    UnsupportedConfig(String),
}

/// Convenience result type for audio output operations.
pub type Result<T> = std::result::Result<T, Error>;
