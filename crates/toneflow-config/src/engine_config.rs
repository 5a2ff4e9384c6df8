//! Engine configuration.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use toneflow_io::{AudioBackend, BackendStreamConfig, RenderEngine, ToneSurface};
use toneflow_synth::{
    ControlMapper, ControlSnapshot, DEFAULT_AMPLITUDE, DEFAULT_FREQUENCY_HZ,
    DEFAULT_MAX_FREQUENCY_HZ, DEFAULT_MIN_FREQUENCY_HZ, DEFAULT_PREVIEW_POINTS,
    DEFAULT_VISUALIZATION_SCALE, FrequencyRange, ParameterStore, PreviewRenderer, WaveformKind,
};

use crate::error::ConfigError;
use crate::validation::{ValidationError, validate_config};

/// Everything needed to stand up a tone surface, loadable from TOML.
///
/// Every field has a default, so a file only needs the values it changes:
///
/// ```toml
/// sample_rate = 48000
/// max_frequency = 4000
/// initial_waveform = "triangle"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requested output sample rate in Hz.
    pub sample_rate: u32,

    /// Output channel count; every channel carries the same signal.
    pub channels: u16,

    /// Preferred buffer size in frames.
    pub buffer_size: u32,

    /// Case-insensitive substring of the output device name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Frequency at the left edge of the surface, in Hz.
    pub min_frequency: f32,

    /// Frequency at the right edge of the surface, in Hz.
    pub max_frequency: f32,

    /// Frequency before the first touch, in Hz.
    pub initial_frequency: f32,

    /// Amplitude before the first touch, in [0, 1].
    pub initial_amplitude: f32,

    /// Waveform before the first selection.
    pub initial_waveform: String,

    /// Divisor from oscillator frequency to cycles shown in the preview.
    pub visualization_scale: f32,

    /// Points per preview trace.
    pub preview_points: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 512,
            device: None,
            min_frequency: DEFAULT_MIN_FREQUENCY_HZ,
            max_frequency: DEFAULT_MAX_FREQUENCY_HZ,
            initial_frequency: DEFAULT_FREQUENCY_HZ,
            initial_amplitude: DEFAULT_AMPLITUDE,
            initial_waveform: WaveformKind::default().name().to_string(),
            visualization_scale: DEFAULT_VISUALIZATION_SCALE,
            preview_points: DEFAULT_PREVIEW_POINTS,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    ///
    /// The file is parsed but not validated; call [`validate`](Self::validate)
    /// or one of the builders.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Check every field, reporting all violations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(validate_config(self)?)
    }

    /// The configured frequency range.
    pub fn frequency_range(&self) -> Result<FrequencyRange, ConfigError> {
        FrequencyRange::new(self.min_frequency, self.max_frequency).map_err(|_| {
            ConfigError::Validation(ValidationError::FrequencyRange {
                min: self.min_frequency,
                max: self.max_frequency,
            })
        })
    }

    /// The configured initial waveform.
    pub fn waveform(&self) -> Result<WaveformKind, ConfigError> {
        self.initial_waveform.parse().map_err(|e: toneflow_synth::UnknownWaveform| {
            ConfigError::Validation(ValidationError::InvalidFormat {
                param: "initial_waveform".to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// Parameters before the first touch.
    pub fn initial_snapshot(&self) -> Result<ControlSnapshot, ConfigError> {
        Ok(ControlSnapshot::new(
            self.initial_frequency,
            self.initial_amplitude,
            self.waveform()?,
        ))
    }

    /// Pointer mapping over the configured range.
    pub fn mapper(&self) -> Result<ControlMapper, ConfigError> {
        Ok(ControlMapper::new(self.frequency_range()?))
    }

    /// Preview renderer at the configured scale.
    pub fn preview_renderer(&self) -> PreviewRenderer {
        PreviewRenderer::new(self.visualization_scale)
    }

    /// Parameter store seeded with the initial values.
    pub fn parameter_store(&self) -> Result<ParameterStore, ConfigError> {
        Ok(ParameterStore::new(
            self.frequency_range()?,
            self.initial_snapshot()?,
        ))
    }

    /// Stream configuration for the backend.
    pub fn stream_config(&self) -> BackendStreamConfig {
        BackendStreamConfig {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
            channels: self.channels,
            device_name: self.device.clone(),
        }
    }

    /// Validate, then build a stopped engine on `backend`.
    pub fn build_engine(
        &self,
        backend: Box<dyn AudioBackend>,
    ) -> Result<RenderEngine, ConfigError> {
        self.validate()?;
        let store = Arc::new(self.parameter_store()?);
        Ok(RenderEngine::new(backend, self.stream_config(), store))
    }

    /// Validate, then build a complete surface on `backend`.
    pub fn build_surface(
        &self,
        backend: Box<dyn AudioBackend>,
    ) -> Result<ToneSurface, ConfigError> {
        let engine = self.build_engine(backend)?;
        Ok(ToneSurface::new(engine, self.preview_renderer()))
    }
}
