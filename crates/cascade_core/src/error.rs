//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the audio engine
///
/// None of these ever cross the real-time processing boundary; failures
/// inside the callbacks are handled locally (silence, passthrough, or an
/// [`crate::Event`]), and these errors surface only from control-path
/// operations like `start()`/`stop()`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio devices found")]
    NoDevicesFound,

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to spawn pipeline thread: {0}")]
    ThreadSpawnError(String),

    #[error("Engine already running")]
    AlreadyRunning,

    #[error("Engine not running")]
    NotRunning,

    #[error("DSP error: {0}")]
    Dsp(#[from] cascade_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
