//! Spectral De-Esser
//!
//! Attenuates a configurable frequency band (sibilance sits around
//! 4-10kHz in voice) by a fixed number of decibels. Works on fixed-size,
//! non-overlapping blocks in double precision: complex FFT, scale every
//! bin inside the band plus its Hermitian mirror, inverse FFT.
//!
//! There is deliberately no windowing or overlap-add here. Block
//! boundaries can produce audible artifacts under heavy reduction; that
//! is a documented property of this algorithm, not a defect to fix, since
//! changing it would change the audible signature.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::effect::{AtomicF32, AudioEffect};
use crate::error::DspError;

/// Fixed block size for the band-reduction transform
pub const DE_ESSER_FRAME_SIZE: usize = 2048;

const DEFAULT_START_FREQ: f32 = 4000.0;
const DEFAULT_END_FREQ: f32 = 10000.0;
const DEFAULT_REDUCTION_DB: f32 = 6.0;

/// Shared, atomically tunable de-esser parameters
pub struct DeEsserParams {
    enabled: AtomicBool,
    start_freq: AtomicF32,
    end_freq: AtomicF32,
    reduction_db: AtomicF32,
}

impl DeEsserParams {
    fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            start_freq: AtomicF32::new(DEFAULT_START_FREQ),
            end_freq: AtomicF32::new(DEFAULT_END_FREQ),
            reduction_db: AtomicF32::new(DEFAULT_REDUCTION_DB),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Set the attenuation band; `start` must be below `end`
    pub fn set_band(&self, start_hz: f32, end_hz: f32) -> Result<(), DspError> {
        if start_hz < 0.0 || start_hz >= end_hz {
            return Err(DspError::InvalidFrequencyBand {
                start: start_hz,
                end: end_hz,
            });
        }
        self.start_freq.store(start_hz);
        self.end_freq.store(end_hz);
        Ok(())
    }

    pub fn band(&self) -> (f32, f32) {
        (self.start_freq.load(), self.end_freq.load())
    }

    /// Set the in-band attenuation in decibels (negative values clamp to 0)
    pub fn set_reduction_db(&self, db: f32) {
        self.reduction_db.store(db.max(0.0));
    }

    pub fn reduction_db(&self) -> f32 {
        self.reduction_db.load()
    }
}

/// Block-wise spectral attenuator
///
/// Stateless across invocations: each block is transformed independently,
/// so there is no envelope or history to reset.
pub struct DeEsser {
    params: Arc<DeEsserParams>,
    sample_rate: f32,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    fft_buf: Vec<Complex<f64>>,
    fft_scratch: Vec<Complex<f64>>,
    /// Double-precision staging for the f32 effect interface
    frame_scratch: Vec<f64>,
}

impl DeEsser {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(DE_ESSER_FRAME_SIZE);
        let inverse = planner.plan_fft_inverse(DE_ESSER_FRAME_SIZE);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            params: Arc::new(DeEsserParams::new()),
            sample_rate,
            forward,
            inverse,
            fft_buf: vec![Complex::default(); DE_ESSER_FRAME_SIZE],
            fft_scratch: vec![Complex::default(); scratch_len],
            frame_scratch: Vec::new(),
        }
    }

    /// Shared parameter block for the control surface
    pub fn params(&self) -> Arc<DeEsserParams> {
        Arc::clone(&self.params)
    }

    /// Attenuate the configured band in place, in fixed non-overlapping
    /// blocks of [`DE_ESSER_FRAME_SIZE`] samples (the final block is
    /// zero-padded; only the valid samples are written back)
    pub fn apply(&mut self, samples: &mut [f64]) {
        if samples.is_empty() {
            return;
        }

        let (start_hz, end_hz) = self.params.band();
        let start_hz = f64::from(start_hz);
        let end_hz = f64::from(end_hz);
        let reduction = 10.0_f64.powf(-f64::from(self.params.reduction_db()) / 20.0);

        let n = DE_ESSER_FRAME_SIZE;
        for chunk in samples.chunks_mut(n) {
            self.fft_buf.fill(Complex::default());
            for (slot, &sample) in self.fft_buf.iter_mut().zip(chunk.iter()) {
                slot.re = sample;
            }

            self.forward
                .process_with_scratch(&mut self.fft_buf, &mut self.fft_scratch);

            for bin in 0..n / 2 {
                let freq = bin as f64 * f64::from(self.sample_rate) / n as f64;
                if freq >= start_hz && freq <= end_hz {
                    self.fft_buf[bin] *= reduction;
                    if bin > 0 {
                        // Hermitian mirror keeps the inverse real
                        self.fft_buf[n - bin] *= reduction;
                    }
                }
            }

            self.inverse
                .process_with_scratch(&mut self.fft_buf, &mut self.fft_scratch);

            for (sample, value) in chunk.iter_mut().zip(self.fft_buf.iter()) {
                *sample = value.re / n as f64;
            }
        }
    }
}

impl AudioEffect for DeEsser {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        if !self.is_enabled() || input.is_empty() {
            output.copy_from_slice(input);
            return;
        }

        self.frame_scratch.clear();
        self.frame_scratch
            .extend(input.iter().map(|&sample| f64::from(sample)));

        // Borrow dance: take the staging buffer out so `apply` can borrow
        // the FFT state mutably
        let mut frame = std::mem::take(&mut self.frame_scratch);
        self.apply(&mut frame);

        for (out, &sample) in output.iter_mut().zip(frame.iter()) {
            *out = sample as f32;
        }
        self.frame_scratch = frame;
    }

    fn reset(&mut self) {
        // Stateless across invocations: nothing carries over between blocks
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled()
    }

    fn name(&self) -> &'static str {
        "De-Esser"
    }
}
