//! ToneFlow Synth - Synthesis core for the toneflow touch tone generator
//!
//! This crate holds everything the real-time render path needs and nothing
//! it must not touch: no I/O, no locks, no allocation on the audio path.
//!
//! # Core Components
//!
//! ## Waveforms
//!
//! - [`WaveformKind`] - Sine, Square, Triangle, Sawtooth
//! - [`sample`] - Pure `(kind, phase) → [-1, 1]` evaluation (naive, not band-limited)
//!
//! ## Oscillator
//!
//! - [`Oscillator`] - Phase accumulator at a fixed sample rate
//! - [`OscillatorState`] - The render-owned phase, passed in by `&mut`
//!
//! ```rust
//! use toneflow_synth::{ControlSnapshot, Oscillator, OscillatorState, WaveformKind};
//!
//! let osc = Oscillator::new(44100.0);
//! let mut state = OscillatorState::new();
//! let snapshot = ControlSnapshot::new(440.0, 0.8, WaveformKind::Triangle);
//!
//! let mut buffer = vec![0.0; 256];
//! osc.advance(&mut state, &snapshot, &mut buffer);
//! ```
//!
//! ## Parameters
//!
//! - [`ParameterStore`] - Lock-free store written by the control path, read by the render path
//! - [`ControlSnapshot`] - Consistent frequency/amplitude/waveform triple
//! - [`ParamUpdate`] - Partial update applied by [`ParameterStore::set`]
//!
//! ```rust
//! use toneflow_synth::{ControlMapper, ParameterStore};
//!
//! let store = ParameterStore::default();
//! let mapper = ControlMapper::new(store.range());
//!
//! // Pointer at the right edge, three quarters up
//! store.set(mapper.update(1.0, 0.75)).unwrap();
//! assert_eq!(store.snapshot().frequency_hz, 2000.0);
//! ```
//!
//! ## Display
//!
//! - [`PreviewRenderer`] - Stateless oscilloscope trace for a snapshot
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc` for
//! [`PreviewRenderer::render_preview`]). Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! toneflow-synth = { version = "0.1", default-features = false }
//! ```
//!
//! [`ParameterStore`] packs its state into an `AtomicU64`, so it is only
//! compiled on targets with `target_has_atomic = "64"`. Everything else,
//! including the oscillator and preview, builds on 32-bit microcontrollers.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod control;
pub mod oscillator;
pub mod params;
pub mod preview;
pub mod waveform;

pub use control::ControlMapper;
pub use oscillator::{Oscillator, OscillatorState};
#[cfg(target_has_atomic = "64")]
pub use params::ParameterStore;
pub use params::{
    ControlSnapshot, DEFAULT_AMPLITUDE, DEFAULT_FREQUENCY_HZ, DEFAULT_MAX_FREQUENCY_HZ,
    DEFAULT_MIN_FREQUENCY_HZ, FrequencyRange, InvalidParameter, ParamUpdate,
};
pub use preview::{
    DEFAULT_PREVIEW_POINTS, DEFAULT_VISUALIZATION_SCALE, PreviewPoint, PreviewRenderer,
};
pub use waveform::{UnknownWaveform, WaveformKind, sample, wrap_phase};
