//! Phase-accumulator oscillator.
//!
//! The oscillator itself only knows the sample rate. Everything that changes
//! while audio runs lives elsewhere: the accumulated phase in
//! [`OscillatorState`] (owned by the render path) and the frequency/waveform in
//! the [`ControlSnapshot`] read once per buffer. Because the phase is never
//! touched when parameters change, a frequency or waveform switch is
//! phase-continuous: at worst the slope changes, the signal never jumps in phase.

use crate::params::{ControlSnapshot, DEFAULT_FREQUENCY_HZ};
use crate::waveform::{WaveformKind, wrap_phase};
use core::f32::consts::TAU;

/// Render-path oscillator state.
///
/// Created with phase 0 at [`DEFAULT_FREQUENCY_HZ`]. Only the render path
/// mutates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorState {
    /// Phase in radians, always in `[0, 2π)`.
    phase: f32,
    /// Frequency used for the most recent sample.
    frequency_hz: f32,
}

impl Default for OscillatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl OscillatorState {
    /// Fresh state: phase 0, 440 Hz.
    pub const fn new() -> Self {
        Self {
            phase: 0.0,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
        }
    }

    /// State resuming at `phase` (reduced to `[0, 2π)`).
    ///
    /// Non-finite phases start from 0.
    pub fn with_phase(phase: f32) -> Self {
        Self {
            phase: wrap_phase(phase),
            ..Self::new()
        }
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Frequency in Hz of the most recently generated sample.
    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    /// Reset phase to 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Naive (non-band-limited) phase-accumulator oscillator.
///
/// # Example
///
/// ```rust
/// use toneflow_synth::{ControlSnapshot, Oscillator, OscillatorState, WaveformKind};
///
/// let osc = Oscillator::new(44100.0);
/// let mut state = OscillatorState::new();
/// let snapshot = ControlSnapshot::new(440.0, 1.0, WaveformKind::Sine);
///
/// let mut buffer = [0.0f32; 64];
/// osc.advance(&mut state, &snapshot, &mut buffer);
/// assert_eq!(buffer[0], 0.0);
/// assert!(state.phase() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    sample_rate: f32,
    radians_per_hz: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl Oscillator {
    /// Create an oscillator for the given sample rate in Hz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            radians_per_hz: TAU / sample_rate,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Phase increment in radians per sample at `frequency_hz`.
    #[inline]
    pub fn phase_increment(&self, frequency_hz: f32) -> f32 {
        frequency_hz * self.radians_per_hz
    }

    /// Generate one sample and advance the phase.
    ///
    /// The sample is taken at the current phase, then the phase moves by one
    /// increment and wraps with a single subtraction. The single subtraction
    /// is exact while `frequency_hz < sample_rate`.
    #[inline]
    pub fn next_sample(&self, state: &mut OscillatorState, snapshot: &ControlSnapshot) -> f32 {
        let increment = self.phase_increment(snapshot.frequency_hz);
        let sample = snapshot.waveform.sample(state.phase);

        state.frequency_hz = snapshot.frequency_hz;
        state.phase += increment;
        if state.phase >= TAU {
            state.phase -= TAU;
        }
        sample
    }

    /// Fill `output` with consecutive unscaled samples.
    ///
    /// Splitting one render into several calls yields the same samples as a
    /// single call over the whole length.
    #[inline]
    pub fn advance(
        &self,
        state: &mut OscillatorState,
        snapshot: &ControlSnapshot,
        output: &mut [f32],
    ) {
        for sample in output.iter_mut() {
            *sample = self.next_sample(state, snapshot);
        }
    }

    /// Convenience for sweeping one waveform at one frequency.
    pub fn advance_with(
        &self,
        state: &mut OscillatorState,
        waveform: WaveformKind,
        frequency_hz: f32,
        output: &mut [f32],
    ) {
        let snapshot = ControlSnapshot::new(frequency_hz, 1.0, waveform);
        self.advance(state, &snapshot, output);
    }
}
