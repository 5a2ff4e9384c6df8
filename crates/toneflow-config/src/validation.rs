//! Engine configuration validation.
//!
//! [`validate_config`] checks every field of an [`EngineConfig`] and reports all
//! violations at once, so a hand-edited file can be fixed in one pass.
//!
//! # Example
//!
//! ```rust
//! use toneflow_config::{EngineConfig, ValidationError, validate_config};
//!
//! let mut config = EngineConfig::default();
//! assert!(validate_config(&config).is_ok());
//!
//! config.channels = 0;
//! config.initial_waveform = "noise".into();
//! match validate_config(&config) {
//!     Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use thiserror::Error;
use toneflow_synth::WaveformKind;

use crate::EngineConfig;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range (or not finite).
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Invalid parameter format.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Name of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// The frequency bounds are reversed or equal.
    #[error("min_frequency {min} must be below max_frequency {max}")]
    FrequencyRange {
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
    },

    /// The oscillator cannot advance more than one cycle per sample.
    #[error("max_frequency {max_frequency} must be below sample_rate {sample_rate}")]
    AboveSampleRate {
        /// Configured upper bound.
        max_frequency: f32,
        /// Configured sample rate.
        sample_rate: u32,
    },

    /// No output channels.
    #[error("channels must be at least 1")]
    ZeroChannels,

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Flatten into a list of individual errors.
    pub fn into_vec(self) -> Vec<ValidationError> {
        match self {
            ValidationError::Multiple(errors) => errors,
            other => vec![other],
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_range(errors: &mut Vec<ValidationError>, param: &str, value: f32, min: f32, max: f32) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            param: param.to_string(),
            value,
            min,
            max,
        });
    }
}

/// Validate an engine configuration, collecting every violation.
///
/// Returns the single error directly when only one check fails, and
/// [`ValidationError::Multiple`] otherwise.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if config.sample_rate == 0 {
        errors.push(ValidationError::OutOfRange {
            param: "sample_rate".to_string(),
            value: 0.0,
            min: 1.0,
            max: f32::INFINITY,
        });
    }
    if config.channels == 0 {
        errors.push(ValidationError::ZeroChannels);
    }
    if config.buffer_size == 0 {
        errors.push(ValidationError::OutOfRange {
            param: "buffer_size".to_string(),
            value: 0.0,
            min: 1.0,
            max: f32::INFINITY,
        });
    }

    let bounds_finite = config.min_frequency.is_finite() && config.max_frequency.is_finite();
    check_range(
        &mut errors,
        "min_frequency",
        config.min_frequency,
        f32::MIN_POSITIVE,
        f32::MAX,
    );
    check_range(
        &mut errors,
        "max_frequency",
        config.max_frequency,
        f32::MIN_POSITIVE,
        f32::MAX,
    );

    if bounds_finite {
        if config.min_frequency >= config.max_frequency {
            errors.push(ValidationError::FrequencyRange {
                min: config.min_frequency,
                max: config.max_frequency,
            });
        } else {
            check_range(
                &mut errors,
                "initial_frequency",
                config.initial_frequency,
                config.min_frequency,
                config.max_frequency,
            );
        }
        if config.sample_rate > 0 && config.max_frequency >= config.sample_rate as f32 {
            errors.push(ValidationError::AboveSampleRate {
                max_frequency: config.max_frequency,
                sample_rate: config.sample_rate,
            });
        }
    }

    check_range(
        &mut errors,
        "initial_amplitude",
        config.initial_amplitude,
        0.0,
        1.0,
    );

    if let Err(e) = config.initial_waveform.parse::<WaveformKind>() {
        errors.push(ValidationError::InvalidFormat {
            param: "initial_waveform".to_string(),
            reason: e.to_string(),
        });
    }

    check_range(
        &mut errors,
        "visualization_scale",
        config.visualization_scale,
        f32::MIN_POSITIVE,
        f32::MAX,
    );
    if config.preview_points < 2 {
        errors.push(ValidationError::OutOfRange {
            param: "preview_points".to_string(),
            value: config.preview_points as f32,
            min: 2.0,
            max: f32::INFINITY,
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
