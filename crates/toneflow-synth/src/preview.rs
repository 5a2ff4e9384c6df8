//! Stateless waveform preview for the oscilloscope widget.
//!
//! The preview does not follow the live oscillator. It sweeps a synthetic
//! phase across the widget, with the frequency divided by a fixed
//! visualization scale so a handful of cycles are visible instead of
//! hundreds. Identical inputs always give identical points.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};
use core::f32::consts::TAU;

use crate::params::ControlSnapshot;
use crate::waveform::{WaveformKind, wrap_phase};

/// Divisor applied to the audio frequency before drawing.
pub const DEFAULT_VISUALIZATION_SCALE: f32 = 20.0;

/// Point count the oscilloscope widget draws.
pub const DEFAULT_PREVIEW_POINTS: usize = 100;

/// One point of the preview polyline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreviewPoint {
    /// Horizontal position in `[0, 1]`, left to right.
    pub x: f32,
    /// Waveform value in `[-1, 1]`, already scaled by amplitude.
    pub y: f32,
}

/// Renders preview points for a waveform.
///
/// ```rust
/// use toneflow_synth::{PreviewRenderer, WaveformKind};
///
/// let preview = PreviewRenderer::default();
/// let points = preview.render_preview(WaveformKind::Sine, 440.0, 0.8, 100);
/// assert_eq!(points.len(), 100);
/// assert_eq!(points[0].x, 0.0);
/// assert_eq!(points[99].x, 1.0);
/// assert!(points.iter().all(|p| p.y.abs() <= 0.8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewRenderer {
    visualization_scale: f32,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self {
            visualization_scale: DEFAULT_VISUALIZATION_SCALE,
        }
    }
}

impl PreviewRenderer {
    /// Create a renderer with a custom frequency divisor.
    ///
    /// Non-positive or non-finite scales fall back to
    /// [`DEFAULT_VISUALIZATION_SCALE`].
    pub fn new(visualization_scale: f32) -> Self {
        let visualization_scale = if visualization_scale.is_finite() && visualization_scale > 0.0
        {
            visualization_scale
        } else {
            DEFAULT_VISUALIZATION_SCALE
        };
        Self {
            visualization_scale,
        }
    }

    /// The frequency divisor in use.
    pub fn visualization_scale(&self) -> f32 {
        self.visualization_scale
    }

    /// Fill `output` with preview points. Allocation-free.
    ///
    /// Amplitude is clamped to `[0, 1]` so the trace stays inside its box.
    /// A non-finite frequency draws a flat line.
    pub fn render_into(
        &self,
        waveform: WaveformKind,
        frequency_hz: f32,
        amplitude: f32,
        output: &mut [PreviewPoint],
    ) {
        let gain = if amplitude.is_finite() {
            amplitude.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let cycles = if frequency_hz.is_finite() {
            frequency_hz / self.visualization_scale
        } else {
            0.0
        };
        let last = output.len().saturating_sub(1);

        for (i, point) in output.iter_mut().enumerate() {
            let x = if last == 0 {
                0.0
            } else {
                i as f32 / last as f32
            };
            let angle = wrap_phase(TAU * x * cycles);
            *point = PreviewPoint {
                x,
                y: waveform.sample(angle) * gain,
            };
        }
    }

    /// Render `sample_count` preview points.
    pub fn render_preview(
        &self,
        waveform: WaveformKind,
        frequency_hz: f32,
        amplitude: f32,
        sample_count: usize,
    ) -> Vec<PreviewPoint> {
        let mut points = vec![PreviewPoint::default(); sample_count];
        self.render_into(waveform, frequency_hz, amplitude, &mut points);
        points
    }

    /// Render a preview of a parameter snapshot.
    pub fn render_snapshot(
        &self,
        snapshot: &ControlSnapshot,
        sample_count: usize,
    ) -> Vec<PreviewPoint> {
        self.render_preview(
            snapshot.waveform,
            snapshot.frequency_hz,
            snapshot.amplitude,
            sample_count,
        )
    }
}
