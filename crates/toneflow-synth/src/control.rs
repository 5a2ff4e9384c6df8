//! Touch-surface coordinate mapping.

use crate::params::{FrequencyRange, ParamUpdate};

/// Maps a normalized pointer position to pitch and loudness.
///
/// `x` runs linearly across the frequency range, `y` is the amplitude. Both are
/// clamped to `[0, 1]` first, since pointer coordinates can overshoot at the
/// surface edges.
///
/// ```rust
/// use toneflow_synth::ControlMapper;
///
/// let mapper = ControlMapper::default();
/// assert_eq!(mapper.map(0.0, 0.0), (10.0, 0.0));
/// assert_eq!(mapper.map(1.0, 1.0), (2000.0, 1.0));
/// assert_eq!(mapper.map(0.5, 0.5), (1005.0, 0.5));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlMapper {
    range: FrequencyRange,
}

impl ControlMapper {
    /// Create a mapper over `range`.
    pub fn new(range: FrequencyRange) -> Self {
        Self { range }
    }

    /// The frequency range `x` spans.
    pub fn range(&self) -> FrequencyRange {
        self.range
    }

    /// Map `(x, y)` to `(frequency_hz, amplitude)`.
    ///
    /// NaN coordinates pass through as NaN so that the parameter store can
    /// reject them.
    #[inline]
    pub fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let x = x.clamp(0.0, 1.0);
        let frequency_hz = self.range.lerp(x);
        let amplitude = y.clamp(0.0, 1.0);
        (frequency_hz, amplitude)
    }

    /// Map `(x, y)` straight into a parameter update.
    pub fn update(&self, x: f32, y: f32) -> ParamUpdate {
        let (frequency_hz, amplitude) = self.map(x, y);
        ParamUpdate::new().frequency(frequency_hz).amplitude(amplitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        let mapper = ControlMapper::default();
        assert_eq!(mapper.map(0.0, 0.0), (10.0, 0.0));
        assert_eq!(mapper.map(1.0, 1.0), (2000.0, 1.0));
        let (f, a) = mapper.map(0.5, 0.5);
        assert!((f - 1005.0).abs() < 1e-3);
        assert_eq!(a, 0.5);
    }

    #[test]
    fn out_of_range_inputs_clamp() {
        let mapper = ControlMapper::default();
        assert_eq!(mapper.map(0.3, 1.5).1, 1.0);
        assert_eq!(mapper.map(0.3, -0.5).1, 0.0);
        assert_eq!(mapper.map(-2.0, 0.5).0, 10.0);
        assert_eq!(mapper.map(7.0, 0.5).0, 2000.0);
    }

    #[test]
    fn custom_range() {
        let mapper = ControlMapper::new(FrequencyRange::new(100.0, 300.0).unwrap());
        assert_eq!(mapper.map(0.25, 0.0).0, 150.0);
    }

    #[test]
    fn update_carries_both_values() {
        let update = ControlMapper::default().update(1.0, 0.25);
        assert_eq!(update.frequency_hz, Some(2000.0));
        assert_eq!(update.amplitude, Some(0.25));
        assert_eq!(update.waveform, None);
    }

    #[test]
    fn nan_passes_through() {
        let (f, a) = ControlMapper::default().map(f32::NAN, f32::NAN);
        assert!(f.is_nan());
        assert!(a.is_nan());
    }
}
