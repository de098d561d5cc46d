//! Audio Effect Trait
//!
//! Defines the interface for the effects in the Cascade processing chain.
//! The worker thread owns each effect exclusively and drives `process()`;
//! tunable parameters live in shared atomic parameter blocks so the control
//! surface can adjust them from another thread without locking.

use std::sync::atomic::{AtomicU32, Ordering};

/// Guard against a zero time constant when deriving smoothing coefficients
pub(crate) const TIME_EPSILON: f32 = 1e-6;

/// Trait for audio effects in the processing chain
///
/// # Contract
///
/// - `process()` must fully populate `output` for `input.len()` samples and
///   never alias the two buffers.
/// - When the effect is disabled, `process()` copies input to output
///   unchanged (true bypass) and clears its own envelope/transform state so
///   nothing stale leaks into the next enabled period. Performing the reset
///   here keeps all state mutation on the worker thread even though the
///   enabled flag is flipped from the control thread.
/// - `reset()` clears transform scratch and envelope state.
pub trait AudioEffect: Send {
    /// Process one block of samples from `input` into `output`
    fn process(&mut self, input: &[f32], output: &mut [f32]);

    /// Clear internal state (envelopes, overlap buffers, band energies)
    fn reset(&mut self);

    /// Whether the effect will actually transform audio right now
    fn is_enabled(&self) -> bool;

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;
}

/// f32 stored as raw bits in an `AtomicU32`
///
/// `AtomicF32` doesn't exist in std, so parameters shared between the
/// control thread and the worker thread are bit-cast. Relaxed ordering is
/// sufficient: a slightly stale read is fine, a torn read would not be.
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub(crate) fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub(crate) fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Exponential smoothing coefficient for a gain envelope
///
/// One-pole filter constant: gains approach their target as
/// `g' = coeff * g + (1 - coeff) * target` per sample, reaching ~63% of the
/// distance within `time_ms`.
#[inline]
pub(crate) fn smoothing_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    let seconds = (time_ms / 1000.0).max(TIME_EPSILON);
    (-1.0 / (seconds * sample_rate)).exp()
}
