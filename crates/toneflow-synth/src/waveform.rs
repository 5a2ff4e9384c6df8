//! Naive waveform shapes evaluated at a phase angle.
//!
//! Every shape is generated from its ideal mathematical form with no
//! band-limiting, so square and sawtooth alias at high frequencies. The
//! functions here are pure: the same `(kind, phase)` always yields the same
//! sample, which is what lets the live oscillator and the preview renderer
//! agree on what a waveform looks like.

#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};
use core::f32::consts::{PI, TAU};
use core::fmt;
use core::str::FromStr;
use libm::{fabsf, fmodf, sinf};

/// Waveform shapes selectable on the tone surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveformKind {
    /// Sine waveform. Pure fundamental.
    #[default]
    Sine,
    /// Square waveform (50% duty cycle), switching at half cycle.
    Square,
    /// Triangle waveform. Continuous, piecewise linear.
    Triangle,
    /// Sawtooth waveform. Linear ramp, discontinuous at wraparound.
    Sawtooth,
}

impl WaveformKind {
    /// All waveform kinds, in picker order.
    pub const ALL: [WaveformKind; 4] = [
        WaveformKind::Sine,
        WaveformKind::Square,
        WaveformKind::Triangle,
        WaveformKind::Sawtooth,
    ];

    /// Lowercase display and configuration name.
    pub const fn name(self) -> &'static str {
        match self {
            WaveformKind::Sine => "sine",
            WaveformKind::Square => "square",
            WaveformKind::Triangle => "triangle",
            WaveformKind::Sawtooth => "sawtooth",
        }
    }

    /// Evaluate this waveform at `phase` (radians in `[0, 2π)`).
    ///
    /// Shorthand for [`sample`].
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        sample(self, phase)
    }

    /// Two-bit code used when packing the kind into an atomic word.
    pub(crate) const fn code(self) -> u8 {
        match self {
            WaveformKind::Sine => 0,
            WaveformKind::Square => 1,
            WaveformKind::Triangle => 2,
            WaveformKind::Sawtooth => 3,
        }
    }

    /// Inverse of [`code`](Self::code). Only the low two bits are read.
    pub(crate) const fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => WaveformKind::Sine,
            1 => WaveformKind::Square,
            2 => WaveformKind::Triangle,
            _ => WaveformKind::Sawtooth,
        }
    }
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a [`WaveformKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown waveform '{0}' (expected sine, square, triangle or sawtooth)")]
pub struct UnknownWaveform(pub String);

impl FromStr for WaveformKind {
    type Err = UnknownWaveform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("saw") {
            return Ok(WaveformKind::Sawtooth);
        }
        WaveformKind::ALL
            .into_iter()
            .find(|kind| s.eq_ignore_ascii_case(kind.name()))
            .ok_or_else(|| UnknownWaveform(s.to_string()))
    }
}

/// Evaluate a waveform at `phase`, returning a value in `[-1.0, 1.0]`.
///
/// `phase` must already be reduced to `[0, 2π)`; use [`wrap_phase`] for
/// arbitrary angles.
///
/// - **Sine**: `sin(phase)`
/// - **Square**: `+1` for the first half cycle, `-1` for the second
/// - **Triangle**: `2·|2t − 1| − 1` with `t = phase / 2π`
/// - **Sawtooth**: `2t − 1`
#[inline]
pub fn sample(kind: WaveformKind, phase: f32) -> f32 {
    match kind {
        WaveformKind::Sine => sinf(phase),
        WaveformKind::Square => {
            if phase < PI {
                1.0
            } else {
                -1.0
            }
        }
        WaveformKind::Triangle => {
            let t = phase / TAU;
            2.0 * fabsf(2.0 * t - 1.0) - 1.0
        }
        WaveformKind::Sawtooth => {
            let t = phase / TAU;
            2.0 * t - 1.0
        }
    }
}

/// Reduce an angle to `[0, 2π)`. Non-finite angles map to `0.0`.
///
/// The remainder is taken exactly with `fmodf`, so the result stays in range
/// however large the input is.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let r = fmodf(phase, TAU);
    let r = if r < 0.0 { r + TAU } else { r };
    // A tiny negative remainder rounds up to TAU when shifted.
    if r < TAU { r } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_libm() {
        for i in 0..64 {
            let phase = i as f32 * TAU / 64.0;
            assert!((sample(WaveformKind::Sine, phase) - sinf(phase)).abs() < 1e-7);
        }
    }

    #[test]
    fn square_switches_at_half_cycle() {
        assert_eq!(sample(WaveformKind::Square, 0.0), 1.0);
        assert_eq!(sample(WaveformKind::Square, PI - 1e-3), 1.0);
        assert_eq!(sample(WaveformKind::Square, PI), -1.0);
        assert_eq!(sample(WaveformKind::Square, TAU - 1e-3), -1.0);
    }

    #[test]
    fn triangle_turns_at_half_cycle() {
        assert!((sample(WaveformKind::Triangle, 0.0) - 1.0).abs() < 1e-6);
        assert!((sample(WaveformKind::Triangle, PI) + 1.0).abs() < 1e-6);
        assert!(sample(WaveformKind::Triangle, PI / 2.0).abs() < 1e-6);
        assert!(sample(WaveformKind::Triangle, 3.0 * PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn sawtooth_ramps_from_minus_one() {
        assert!((sample(WaveformKind::Sawtooth, 0.0) + 1.0).abs() < 1e-6);
        assert!(sample(WaveformKind::Sawtooth, PI).abs() < 1e-6);
        assert!(sample(WaveformKind::Sawtooth, TAU - 1e-4) > 0.99);
    }

    #[test]
    fn codes_round_trip() {
        for kind in WaveformKind::ALL {
            assert_eq!(WaveformKind::from_code(kind.code()), kind);
        }
    }

    #[test]
    fn parse_names_case_insensitive() {
        assert_eq!("Sine".parse::<WaveformKind>(), Ok(WaveformKind::Sine));
        assert_eq!(" SQUARE ".parse::<WaveformKind>(), Ok(WaveformKind::Square));
        assert_eq!("saw".parse::<WaveformKind>(), Ok(WaveformKind::Sawtooth));
        assert_eq!(
            "noise".parse::<WaveformKind>(),
            Err(UnknownWaveform("noise".to_string()))
        );
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(WaveformKind::Triangle.to_string(), "triangle");
    }

    #[test]
    fn wrap_phase_reduces_into_range() {
        assert_eq!(wrap_phase(0.0), 0.0);
        assert!((wrap_phase(TAU + 1.0) - 1.0).abs() < 1e-5);
        assert!((wrap_phase(-1.0) - (TAU - 1.0)).abs() < 1e-5);
        let w = wrap_phase(1000.0 * TAU + 0.25);
        assert!((0.0..TAU).contains(&w));
    }

    #[test]
    fn wrap_phase_handles_huge_angles() {
        for angle in [1.0e9, -1.0e9, 3.407_832_4e9, 1.0e30, -1.0e30, f32::MAX, f32::MIN] {
            let w = wrap_phase(angle);
            assert!((0.0..TAU).contains(&w), "{angle} wrapped to {w}");
        }
        assert_eq!(wrap_phase(-f32::EPSILON * 1.0e-3), 0.0);
    }

    #[test]
    fn wrap_phase_non_finite_is_zero() {
        assert_eq!(wrap_phase(f32::NAN), 0.0);
        assert_eq!(wrap_phase(f32::INFINITY), 0.0);
        assert_eq!(wrap_phase(f32::NEG_INFINITY), 0.0);
    }
}
