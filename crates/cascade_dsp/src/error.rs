//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Invalid EQ band index: {0} (must be 0-2)")]
    InvalidBandIndex(usize),

    #[error("Invalid cutoff index: {0} (must be 0-1)")]
    InvalidCutoffIndex(usize),

    #[error("Invalid frequency band: start {start}Hz must be below end {end}Hz")]
    InvalidFrequencyBand { start: f32, end: f32 },
}
