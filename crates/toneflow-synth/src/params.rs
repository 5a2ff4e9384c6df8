//! Lock-free parameter store shared by the control and render paths.
//!
//! The control path writes frequency, amplitude and waveform through
//! [`ParameterStore::set`]; the render callback reads all three at once through
//! [`ParameterStore::snapshot`]. The three values live in a single `AtomicU64`
//! so a snapshot is always the exact triple produced by one `set`, and reading
//! it is one atomic load.
//!
//! ## Packing
//!
//! ```text
//!  63   62 ........ 32   31   30 ......... 0
//! ┌────┬─────────────┬────┬───────────────┐
//! │ w1 │ amplitude   │ w0 │ frequency     │
//! │    │ (f32 bits,  │    │ (f32 bits,    │
//! │    │  no sign)   │    │  no sign)     │
//! └────┴─────────────┴────┴───────────────┘
//! ```
//!
//! Frequency and amplitude are clamped to non-negative ranges before storage,
//! so their sign bits are free to carry the two-bit waveform code.
//!
//! The store only exists on targets with native 64-bit atomics
//! (`target_has_atomic = "64"`). Snapshots, updates and ranges are available
//! everywhere.

use crate::waveform::WaveformKind;
use core::fmt;
#[cfg(target_has_atomic = "64")]
use core::sync::atomic::{AtomicU64, Ordering};

/// Default lower bound of the playable frequency range in Hz.
pub const DEFAULT_MIN_FREQUENCY_HZ: f32 = 10.0;

/// Default upper bound of the playable frequency range in Hz.
pub const DEFAULT_MAX_FREQUENCY_HZ: f32 = 2000.0;

/// Frequency the engine starts at (A4).
pub const DEFAULT_FREQUENCY_HZ: f32 = 440.0;

/// Amplitude the engine starts at (pointer resting at mid-height).
pub const DEFAULT_AMPLITUDE: f32 = 0.5;

const MAGNITUDE_MASK: u32 = 0x7FFF_FFFF;
const SIGN_SHIFT: u32 = 31;

/// A rejected control-path value.
///
/// Raised on the control path only; the render path never observes a value
/// that produced one of these.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InvalidParameter {
    /// Frequency was NaN or infinite.
    #[error("frequency must be finite, got {0}")]
    NonFiniteFrequency(f32),

    /// Amplitude was NaN or infinite.
    #[error("amplitude must be finite, got {0}")]
    NonFiniteAmplitude(f32),

    /// Frequency range bounds were not finite or not `0 < min < max`.
    #[error("invalid frequency range [{min}, {max}]: expected finite bounds with 0 < min < max")]
    FrequencyRange {
        /// Requested lower bound.
        min: f32,
        /// Requested upper bound.
        max: f32,
    },
}

/// Inclusive playable frequency range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    min: f32,
    max: f32,
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_FREQUENCY_HZ,
            max: DEFAULT_MAX_FREQUENCY_HZ,
        }
    }
}

impl FrequencyRange {
    /// Create a range, rejecting non-finite or inverted bounds.
    pub fn new(min: f32, max: f32) -> Result<Self, InvalidParameter> {
        if min.is_finite() && max.is_finite() && min > 0.0 && min < max {
            Ok(Self { min, max })
        } else {
            Err(InvalidParameter::FrequencyRange { min, max })
        }
    }

    /// Lower bound in Hz.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound in Hz.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Width of the range in Hz.
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Clamp a frequency into the range.
    #[inline]
    pub fn clamp(&self, frequency_hz: f32) -> f32 {
        frequency_hz.clamp(self.min, self.max)
    }

    /// Linear position `t` in `[0, 1]` to a frequency (`t = 0` → min).
    #[inline]
    pub fn lerp(&self, t: f32) -> f32 {
        t * self.span() + self.min
    }
}

/// One consistent view of the control parameters.
///
/// Captured once per render buffer and also used for display readouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    /// Oscillator frequency in Hz.
    pub frequency_hz: f32,
    /// Post-oscillator gain in `[0, 1]`.
    pub amplitude: f32,
    /// Selected waveform shape.
    pub waveform: WaveformKind,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            amplitude: DEFAULT_AMPLITUDE,
            waveform: WaveformKind::Sine,
        }
    }
}

impl ControlSnapshot {
    /// Create a snapshot from raw values (no clamping).
    pub const fn new(frequency_hz: f32, amplitude: f32, waveform: WaveformKind) -> Self {
        Self {
            frequency_hz,
            amplitude,
            waveform,
        }
    }

    /// Frequency truncated to whole hertz, as shown on the readout.
    pub fn frequency_readout(&self) -> u32 {
        self.frequency_hz as u32
    }

    /// Amplitude as a whole percentage, as shown on the readout.
    pub fn volume_percent(&self) -> u32 {
        (self.amplitude * 100.0) as u32
    }

    #[cfg_attr(not(target_has_atomic = "64"), allow(dead_code))]
    fn pack(&self) -> u64 {
        let code = u32::from(self.waveform.code());
        let freq = (self.frequency_hz.to_bits() & MAGNITUDE_MASK) | ((code & 1) << SIGN_SHIFT);
        let amp = (self.amplitude.to_bits() & MAGNITUDE_MASK) | ((code >> 1) << SIGN_SHIFT);
        (u64::from(amp) << 32) | u64::from(freq)
    }

    #[cfg_attr(not(target_has_atomic = "64"), allow(dead_code))]
    fn unpack(bits: u64) -> Self {
        let freq = bits as u32;
        let amp = (bits >> 32) as u32;
        let code = (freq >> SIGN_SHIFT) | ((amp >> SIGN_SHIFT) << 1);
        Self {
            frequency_hz: f32::from_bits(freq & MAGNITUDE_MASK),
            amplitude: f32::from_bits(amp & MAGNITUDE_MASK),
            waveform: WaveformKind::from_code(code as u8),
        }
    }
}

impl fmt::Display for ControlSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} Hz {}%",
            self.waveform,
            self.frequency_readout(),
            self.volume_percent()
        )
    }
}

/// Partial parameter change. Fields left as `None` keep their current value.
///
/// ```rust
/// use toneflow_synth::{ParamUpdate, WaveformKind};
///
/// let update = ParamUpdate::new()
///     .frequency(880.0)
///     .waveform(WaveformKind::Square);
/// assert_eq!(update.amplitude, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParamUpdate {
    /// New frequency in Hz.
    pub frequency_hz: Option<f32>,
    /// New amplitude.
    pub amplitude: Option<f32>,
    /// New waveform.
    pub waveform: Option<WaveformKind>,
}

impl ParamUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frequency in Hz.
    pub fn frequency(mut self, frequency_hz: f32) -> Self {
        self.frequency_hz = Some(frequency_hz);
        self
    }

    /// Set the amplitude.
    pub fn amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = Some(amplitude);
        self
    }

    /// Set the waveform.
    pub fn waveform(mut self, waveform: WaveformKind) -> Self {
        self.waveform = Some(waveform);
        self
    }

    /// Whether this update carries no changes.
    pub fn is_empty(&self) -> bool {
        self.frequency_hz.is_none() && self.amplitude.is_none() && self.waveform.is_none()
    }

    fn validate(&self) -> Result<(), InvalidParameter> {
        if let Some(f) = self.frequency_hz.filter(|f| !f.is_finite()) {
            return Err(InvalidParameter::NonFiniteFrequency(f));
        }
        if let Some(a) = self.amplitude.filter(|a| !a.is_finite()) {
            return Err(InvalidParameter::NonFiniteAmplitude(a));
        }
        Ok(())
    }

    fn apply(&self, current: ControlSnapshot, range: &FrequencyRange) -> ControlSnapshot {
        ControlSnapshot {
            frequency_hz: self
                .frequency_hz
                .map_or(current.frequency_hz, |f| range.clamp(f)),
            amplitude: self
                .amplitude
                .map_or(current.amplitude, |a| a.clamp(0.0, 1.0)),
            waveform: self.waveform.unwrap_or(current.waveform),
        }
    }
}

/// Thread-safe holder of the current [`ControlSnapshot`].
///
/// Share it between threads with `Arc`. Writers never block readers and
/// readers never block writers.
///
/// ```rust
/// use toneflow_synth::{ParameterStore, ParamUpdate, WaveformKind};
///
/// let store = ParameterStore::default();
/// store.set(ParamUpdate::new().frequency(5000.0).amplitude(1.5)).unwrap();
///
/// let snap = store.snapshot();
/// assert_eq!(snap.frequency_hz, 2000.0); // clamped to the range
/// assert_eq!(snap.amplitude, 1.0);
/// assert_eq!(snap.waveform, WaveformKind::Sine);
/// ```
#[cfg(target_has_atomic = "64")]
pub struct ParameterStore {
    packed: AtomicU64,
    range: FrequencyRange,
}

#[cfg(target_has_atomic = "64")]
impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(FrequencyRange::default(), ControlSnapshot::default())
    }
}

#[cfg(target_has_atomic = "64")]
impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("range", &self.range)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

#[cfg(target_has_atomic = "64")]
impl ParameterStore {
    /// Create a store holding `initial`, clamped into `range`.
    ///
    /// Non-finite initial values fall back to the defaults.
    pub fn new(range: FrequencyRange, initial: ControlSnapshot) -> Self {
        let defaults = ControlSnapshot::default();
        let seed = ControlSnapshot {
            frequency_hz: if initial.frequency_hz.is_finite() {
                initial.frequency_hz
            } else {
                defaults.frequency_hz
            },
            amplitude: if initial.amplitude.is_finite() {
                initial.amplitude
            } else {
                defaults.amplitude
            },
            waveform: initial.waveform,
        };
        let update = ParamUpdate::new()
            .frequency(seed.frequency_hz)
            .amplitude(seed.amplitude);
        let initial = update.apply(seed, &range);
        Self {
            packed: AtomicU64::new(initial.pack()),
            range,
        }
    }

    /// The frequency range used to clamp writes.
    pub fn range(&self) -> FrequencyRange {
        self.range
    }

    /// Read all parameters at once. Real-time safe: a single atomic load.
    #[inline]
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot::unpack(self.packed.load(Ordering::Acquire))
    }

    /// Apply a partial update and return the resulting snapshot.
    ///
    /// Frequency is clamped to [`range`](Self::range), amplitude to `[0, 1]`.
    /// Non-finite values reject the whole update and leave the store as is.
    pub fn set(&self, update: ParamUpdate) -> Result<ControlSnapshot, InvalidParameter> {
        if let Err(err) = update.validate() {
            #[cfg(feature = "tracing")]
            tracing::warn!(%err, "rejected parameter update");
            return Err(err);
        }

        Ok(self.commit(update))
    }

    /// Set only the frequency.
    pub fn set_frequency(&self, frequency_hz: f32) -> Result<ControlSnapshot, InvalidParameter> {
        self.set(ParamUpdate::new().frequency(frequency_hz))
    }

    /// Set only the amplitude.
    pub fn set_amplitude(&self, amplitude: f32) -> Result<ControlSnapshot, InvalidParameter> {
        self.set(ParamUpdate::new().amplitude(amplitude))
    }

    /// Set only the waveform. Cannot fail.
    pub fn set_waveform(&self, waveform: WaveformKind) -> ControlSnapshot {
        self.commit(ParamUpdate::new().waveform(waveform))
    }

    /// Merge a validated update into the stored word with a CAS loop.
    fn commit(&self, update: ParamUpdate) -> ControlSnapshot {
        let range = self.range;
        let merge = |bits| update.apply(ControlSnapshot::unpack(bits), &range);
        let previous = match self
            .packed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(merge(bits).pack())
            }) {
            Ok(bits) | Err(bits) => bits,
        };
        merge(previous)
    }
}
