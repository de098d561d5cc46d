//! Spectral Noise Gate
//!
//! Decides once per block whether the signal is above the noise floor by
//! looking at average energy across log-spaced frequency bands, then opens
//! or closes a continuous gain envelope per sample with asymmetric
//! attack/release smoothing. The gate state is the envelope itself - there
//! are no discrete open/closed states, just a gain in [0, 1].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::effect::{smoothing_coeff, AtomicF32, AudioEffect};

/// Number of log-spaced analysis bands the spectrum is folded into
pub const NUM_BANDS: usize = 4;

/// Default analysis FFT size (power of 2)
pub const DEFAULT_GATE_FFT_SIZE: usize = 1024;

const MIN_ATTACK_MS: f32 = 0.1;
const MIN_RELEASE_MS: f32 = 1.0;

const DEFAULT_THRESHOLD: f32 = 0.05;
const DEFAULT_ATTACK_MS: f32 = 20.0;
const DEFAULT_RELEASE_MS: f32 = 200.0;

/// Shared, atomically tunable noise gate parameters
///
/// The control surface holds a clone of the `Arc<GateParams>` and writes
/// through the setters; the worker thread reads on every processed block.
/// All values are clamped at the setter boundary, never at use time, and
/// the smoothing coefficients are re-derived inside the setter so they are
/// never stale relative to the last time-constant write.
pub struct GateParams {
    enabled: AtomicBool,
    threshold: AtomicF32,
    attack_ms: AtomicF32,
    release_ms: AtomicF32,
    attack_coeff: AtomicF32,
    release_coeff: AtomicF32,
    sample_rate: f32,
}

impl GateParams {
    fn new(sample_rate: f32, threshold: f32, attack_ms: f32, release_ms: f32) -> Self {
        let params = Self {
            enabled: AtomicBool::new(false),
            threshold: AtomicF32::new(0.0),
            attack_ms: AtomicF32::new(0.0),
            release_ms: AtomicF32::new(0.0),
            attack_coeff: AtomicF32::new(0.0),
            release_coeff: AtomicF32::new(0.0),
            sample_rate,
        };
        params.set_threshold(threshold);
        params.set_attack_ms(attack_ms);
        params.set_release_ms(release_ms);
        params
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Set the gate threshold (clamped to 0.0 - 1.0, lower = more passes)
    pub fn set_threshold(&self, threshold: f32) {
        self.threshold.store(threshold.clamp(0.0, 1.0));
    }

    pub fn threshold(&self) -> f32 {
        self.threshold.load()
    }

    /// Set the attack time in milliseconds (minimum 0.1ms)
    pub fn set_attack_ms(&self, ms: f32) {
        let ms = ms.max(MIN_ATTACK_MS);
        self.attack_ms.store(ms);
        self.attack_coeff.store(smoothing_coeff(ms, self.sample_rate));
    }

    pub fn attack_ms(&self) -> f32 {
        self.attack_ms.load()
    }

    /// Set the release time in milliseconds (minimum 1.0ms)
    pub fn set_release_ms(&self, ms: f32) {
        let ms = ms.max(MIN_RELEASE_MS);
        self.release_ms.store(ms);
        self.release_coeff.store(smoothing_coeff(ms, self.sample_rate));
    }

    pub fn release_ms(&self) -> f32 {
        self.release_ms.load()
    }
}

/// FFT-based noise gate
///
/// Owns its transform scratch exclusively; only the shared [`GateParams`]
/// block is visible to other threads.
pub struct NoiseGate {
    params: Arc<GateParams>,
    fft_size: usize,
    /// `None` if FFT setup failed at construction - the gate then stays a
    /// permanent passthrough instead of erroring on the real-time path
    fft: Option<Arc<dyn Fft<f64>>>,
    fft_buf: Vec<Complex<f64>>,
    fft_scratch: Vec<Complex<f64>>,
    band_energies: [f64; NUM_BANDS],
    current_gain: f32,
}

impl NoiseGate {
    /// Create a noise gate with explicit parameters
    pub fn new(
        sample_rate: f32,
        fft_size: usize,
        threshold: f32,
        attack_ms: f32,
        release_ms: f32,
    ) -> Self {
        let params = Arc::new(GateParams::new(sample_rate, threshold, attack_ms, release_ms));

        let usable = fft_size >= 4 && fft_size.is_power_of_two();
        let (fft, fft_buf, fft_scratch) = if usable {
            let fft = FftPlanner::new().plan_fft_forward(fft_size);
            let scratch_len = fft.get_inplace_scratch_len();
            (
                Some(fft),
                vec![Complex::default(); fft_size],
                vec![Complex::default(); scratch_len],
            )
        } else {
            (None, Vec::new(), Vec::new())
        };

        Self {
            params,
            fft_size,
            fft,
            fft_buf,
            fft_scratch,
            band_energies: [0.0; NUM_BANDS],
            current_gain: 0.0,
        }
    }

    /// Create a noise gate with default tuning
    pub fn with_defaults(sample_rate: f32) -> Self {
        Self::new(
            sample_rate,
            DEFAULT_GATE_FFT_SIZE,
            DEFAULT_THRESHOLD,
            DEFAULT_ATTACK_MS,
            DEFAULT_RELEASE_MS,
        )
    }

    /// Shared parameter block for the control surface
    pub fn params(&self) -> Arc<GateParams> {
        Arc::clone(&self.params)
    }

    /// Current envelope gain (0 = closed, 1 = open); for meters and tests
    pub fn current_gain(&self) -> f32 {
        self.current_gain
    }

    /// Hard open/closed decision for one block: 1.0 if the normalized
    /// average band energy exceeds threshold squared, else 0.0
    fn target_gain(&mut self, input: &[f32]) -> f32 {
        let fft = match &self.fft {
            Some(fft) => Arc::clone(fft),
            None => return 1.0,
        };

        // Zero-pad/copy up to fft_size samples into the transform input
        self.fft_buf.fill(Complex::default());
        for (slot, &sample) in self.fft_buf.iter_mut().zip(input) {
            slot.re = f64::from(sample);
        }
        fft.process_with_scratch(&mut self.fft_buf, &mut self.fft_scratch);

        self.fold_band_energies();

        let total: f64 = self.band_energies.iter().sum();
        let avg = total / NUM_BANDS as f64;
        let normalized = avg / self.fft_size as f64;

        let threshold = f64::from(self.params.threshold());
        if normalized > threshold * threshold {
            1.0
        } else {
            0.0
        }
    }

    /// Sum per-bin squared magnitudes into NUM_BANDS log-spaced bands
    fn fold_band_energies(&mut self) {
        self.band_energies = [0.0; NUM_BANDS];

        let half = self.fft_size / 2;
        let denom = ((half - 1) as f64).log2();

        // Bins [1, fft_size/2): skip DC, positive frequencies only
        for (bin, value) in self.fft_buf[1..half].iter().enumerate() {
            let bin = bin + 1;
            let energy = value.norm_sqr();
            let band = ((NUM_BANDS - 1) as f64 * (bin as f64).log2() / denom) as usize;
            self.band_energies[band.min(NUM_BANDS - 1)] += energy;
        }
    }
}

impl AudioEffect for NoiseGate {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        if !self.is_enabled() || input.is_empty() {
            output.copy_from_slice(input);
            if !self.is_enabled() {
                // Re-enabling starts fully closed
                self.reset();
            }
            return;
        }

        let target = self.target_gain(input);
        let attack = self.params.attack_coeff.load();
        let release = self.params.release_coeff.load();

        for (out, &sample) in output.iter_mut().zip(input) {
            if target > self.current_gain {
                // Opening: attack speed, never overshoot above target
                self.current_gain = attack * self.current_gain + (1.0 - attack) * target;
                self.current_gain = self.current_gain.min(target);
            } else {
                // Closing: release speed, never undershoot below target
                self.current_gain = release * self.current_gain + (1.0 - release) * target;
                self.current_gain = self.current_gain.max(target);
            }
            *out = sample * self.current_gain;
        }
    }

    fn reset(&mut self) {
        self.band_energies = [0.0; NUM_BANDS];
        self.current_gain = 0.0;
    }

    fn is_enabled(&self) -> bool {
        self.fft.is_some() && self.params.is_enabled()
    }

    fn name(&self) -> &'static str {
        "Noise Gate"
    }
}
