//! Touch surface facade.
//!
//! [`ToneSurface`] is the single entry point a UI layer needs: feed it pointer
//! positions and releases, pick a waveform, and read back the numbers and the
//! oscilloscope trace to draw. Dragging anywhere on the surface starts the
//! tone; lifting the pointer stops it.

use toneflow_synth::{
    ControlMapper, ControlSnapshot, InvalidParameter, PreviewPoint, PreviewRenderer, WaveformKind,
};

use crate::engine::{EngineStartError, RenderEngine};

/// Errors surfaced to the control path.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The pointer produced a non-finite parameter; nothing was changed.
    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameter),

    /// Parameters were stored but the audio stream could not be opened.
    #[error(transparent)]
    EngineStart(#[from] EngineStartError),
}

/// Pointer-driven front end over a [`RenderEngine`].
#[derive(Debug)]
pub struct ToneSurface {
    engine: RenderEngine,
    mapper: ControlMapper,
    preview: PreviewRenderer,
}

impl ToneSurface {
    /// Wrap `engine`, mapping pointer positions onto its store's frequency range.
    pub fn new(engine: RenderEngine, preview: PreviewRenderer) -> Self {
        let mapper = ControlMapper::new(engine.store().range());
        Self {
            engine,
            mapper,
            preview,
        }
    }

    /// Handle a pointer press or drag at normalized `(x, y)`.
    ///
    /// Stores the mapped frequency and amplitude, then starts the engine if it
    /// is not already running. Returns the stored values.
    ///
    /// # Errors
    ///
    /// [`ControlError::InvalidParameter`] if `x` or `y` is NaN (the store is
    /// left untouched and the engine is not started), or
    /// [`ControlError::EngineStart`] if the backend refuses to open a stream.
    pub fn pointer_moved(&mut self, x: f32, y: f32) -> Result<ControlSnapshot, ControlError> {
        let snapshot = self.engine.store().set(self.mapper.update(x, y))?;
        tracing::trace!(
            x,
            y,
            frequency = snapshot.frequency_hz,
            amplitude = snapshot.amplitude,
            "pointer moved"
        );
        self.engine.start()?;
        Ok(snapshot)
    }

    /// Handle the pointer lifting off the surface.
    pub fn pointer_released(&mut self) {
        self.engine.stop();
    }

    /// Select the waveform. Takes effect at the next buffer whether or not the
    /// tone is sounding.
    pub fn set_waveform(&self, waveform: WaveformKind) -> ControlSnapshot {
        tracing::debug!(%waveform, "waveform selected");
        self.engine.store().set_waveform(waveform)
    }

    /// Values to show in the frequency and volume readouts.
    pub fn readout(&self) -> ControlSnapshot {
        self.engine.snapshot()
    }

    /// Oscilloscope trace of the current parameters.
    pub fn preview(&self, point_count: usize) -> Vec<PreviewPoint> {
        self.preview.render_snapshot(&self.engine.snapshot(), point_count)
    }

    /// The pointer mapping in use.
    pub fn mapper(&self) -> &ControlMapper {
        &self.mapper
    }

    /// The underlying engine.
    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    /// Mutable access to the engine, e.g. to reset its phase while stopped.
    pub fn engine_mut(&mut self) -> &mut RenderEngine {
        &mut self.engine
    }
}
