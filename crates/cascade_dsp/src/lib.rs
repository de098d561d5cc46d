//! Cascade DSP - Digital Signal Processing Module
//!
//! This crate provides the effects for the Cascade streaming engine:
//! - Spectral noise gate with asymmetric attack/release envelope
//! - Three-band overlap-add STFT equalizer
//! - Block-wise spectral de-esser
//! - Sample-domain peak limiter
//!
//! # Architecture
//!
//! Each effect is owned exclusively by the processing thread and driven
//! through the [`AudioEffect`] trait. Tunables live in shared `Arc`
//! parameter blocks built from atomics, so a control surface can adjust
//! thresholds, gains and time constants from another thread without locks;
//! a slightly stale read on the audio path is acceptable, a torn one is
//! not. Derived smoothing coefficients are recomputed inside the setters,
//! never on the hot path.
//!
//! FFT plans and scratch buffers are allocated once at construction. If a
//! plan cannot be built, the effect marks itself permanently disabled and
//! passes audio through unchanged rather than surfacing an error on the
//! real-time path.

mod de_esser;
mod effect;
mod error;
mod limiter;
mod noise_gate;
mod three_band_eq;

pub use de_esser::{DeEsser, DeEsserParams, DE_ESSER_FRAME_SIZE};
pub use effect::AudioEffect;
pub use error::DspError;
pub use limiter::{Limiter, LimiterParams};
pub use noise_gate::{GateParams, NoiseGate, DEFAULT_GATE_FFT_SIZE, NUM_BANDS};
pub use three_band_eq::{EqParams, ThreeBandEQ, DEFAULT_EQ_HOP_SIZE, NUM_EQ_BANDS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let _gate = NoiseGate::with_defaults(48000.0);
        let _eq = ThreeBandEQ::with_defaults(48000.0);
        let _de_esser = DeEsser::new(48000.0);
        let _limiter = Limiter::with_defaults(48000.0);
    }
}
