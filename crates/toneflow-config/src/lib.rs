//! Configuration for the toneflow touch tone generator.
//!
//! [`EngineConfig`] collects the constants the synthesis and output layers
//! need (sample rate, channel layout, frequency range, initial parameters,
//! preview shape) and loads them from TOML. It validates the whole file at
//! once and builds ready-to-use engines and surfaces from it.
//!
//! # Example
//!
//! ```rust,no_run
//! use toneflow_config::EngineConfig;
//! use toneflow_io::CpalBackend;
//!
//! let config = EngineConfig::load("toneflow.toml").unwrap();
//! let mut surface = config.build_surface(Box::new(CpalBackend::new())).unwrap();
//!
//! surface.pointer_moved(0.5, 0.5).unwrap();
//! let trace = surface.preview(config.preview_points);
//! ```

mod engine_config;
mod error;

/// Engine configuration validation.
pub mod validation;

pub use engine_config::EngineConfig;
pub use error::ConfigError;
pub use validation::{ValidationError, ValidationResult, validate_config};
