//! Three-Band Overlap-Add STFT Equalizer
//!
//! Spectral low/mid/high shaping with 50% overlap and Hann analysis
//! windowing. Each `process()` call consumes exactly one hop of new
//! samples (half the FFT size), shifts it into the input history, applies
//! per-bin gain with a raised-cosine crossfade around the two crossover
//! frequencies, and reconstructs the output through an overlap-add ring.
//!
//! The hop-size precondition is hard: any other block size produces a
//! silent block rather than misaligned audio.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::effect::{AtomicF32, AudioEffect};
use crate::error::DspError;

/// Low, mid, high
pub const NUM_EQ_BANDS: usize = 3;

/// Default processing hop (one block at the engine's nominal frame size)
pub const DEFAULT_EQ_HOP_SIZE: usize = 1024;

const MIN_BAND_GAIN: f32 = 0.0;
const MAX_BAND_GAIN: f32 = 6.0;
const MIN_CUTOFF_HZ: f32 = 20.0;

const DEFAULT_LOW_MID_CUTOFF: f32 = 250.0;
const DEFAULT_MID_HIGH_CUTOFF: f32 = 4000.0;

/// Transition zones span cutoff*0.8 to cutoff*1.2
const TRANSITION_LOW_FACTOR: f32 = 0.8;
const TRANSITION_HIGH_FACTOR: f32 = 1.2;

/// Shared, atomically tunable EQ parameters
///
/// Gains are linear multipliers clamped to [0, 6]; the two crossover
/// cutoffs are clamped to [20 Hz, Nyquist]. Clamping happens here, at the
/// setter boundary, never at use time.
pub struct EqParams {
    enabled: AtomicBool,
    band_gains: [AtomicF32; NUM_EQ_BANDS],
    cutoffs: [AtomicF32; NUM_EQ_BANDS - 1],
    sample_rate: f32,
}

impl EqParams {
    fn new(sample_rate: f32) -> Self {
        let params = Self {
            enabled: AtomicBool::new(false),
            band_gains: core::array::from_fn(|_| AtomicF32::new(1.0)),
            cutoffs: core::array::from_fn(|_| AtomicF32::new(0.0)),
            sample_rate,
        };
        // Setters so the defaults go through the same clamping path
        let _ = params.set_band_cutoff(0, DEFAULT_LOW_MID_CUTOFF);
        let _ = params.set_band_cutoff(1, DEFAULT_MID_HIGH_CUTOFF);
        params
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Set the linear gain for a band (0 = low, 1 = mid, 2 = high)
    pub fn set_band_gain(&self, band: usize, gain: f32) -> Result<(), DspError> {
        if band >= NUM_EQ_BANDS {
            return Err(DspError::InvalidBandIndex(band));
        }
        self.band_gains[band].store(gain.clamp(MIN_BAND_GAIN, MAX_BAND_GAIN));
        Ok(())
    }

    pub fn band_gain(&self, band: usize) -> f32 {
        if band < NUM_EQ_BANDS {
            self.band_gains[band].load()
        } else {
            1.0
        }
    }

    pub fn band_gains(&self) -> [f32; NUM_EQ_BANDS] {
        core::array::from_fn(|i| self.band_gains[i].load())
    }

    /// Set a crossover frequency (0 = low/mid, 1 = mid/high)
    pub fn set_band_cutoff(&self, index: usize, frequency: f32) -> Result<(), DspError> {
        if index >= NUM_EQ_BANDS - 1 {
            return Err(DspError::InvalidCutoffIndex(index));
        }
        let nyquist = self.sample_rate / 2.0;
        self.cutoffs[index].store(frequency.clamp(MIN_CUTOFF_HZ, nyquist));
        Ok(())
    }

    pub fn band_cutoff(&self, index: usize) -> f32 {
        if index < NUM_EQ_BANDS - 1 {
            self.cutoffs[index].load()
        } else {
            0.0
        }
    }

    /// Band gain at `frequency`, with a raised-cosine crossfade between
    /// adjacent bands inside each transition zone
    fn smooth_gain(&self, frequency: f32) -> f32 {
        let [low, mid, high] = self.band_gains();
        let low_mid = self.cutoffs[0].load();
        let mid_high = self.cutoffs[1].load();

        let t1_start = low_mid * TRANSITION_LOW_FACTOR;
        let t1_end = low_mid * TRANSITION_HIGH_FACTOR;
        let t2_start = mid_high * TRANSITION_LOW_FACTOR;
        let t2_end = mid_high * TRANSITION_HIGH_FACTOR;

        if frequency < t1_start {
            low
        } else if frequency > t1_end && frequency < t2_start {
            mid
        } else if frequency > t2_end {
            high
        } else if frequency <= t1_end {
            // Low -> mid crossfade
            let t = (frequency - t1_start) / (t1_end - t1_start);
            let t = (1.0 - (t * std::f32::consts::PI).cos()) * 0.5;
            low * (1.0 - t) + mid * t
        } else {
            // Mid -> high crossfade
            let t = (frequency - t2_start) / (t2_end - t2_start);
            let t = (1.0 - (t * std::f32::consts::PI).cos()) * 0.5;
            mid * (1.0 - t) + high * t
        }
    }
}

/// Overlap-add STFT equalizer
pub struct ThreeBandEQ {
    params: Arc<EqParams>,
    sample_rate: f32,
    hop_size: usize,
    fft_size: usize,
    /// `None` if setup failed at construction (zero hop size); the EQ then
    /// stays a permanent passthrough
    plans: Option<EqPlans>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    window: Vec<f64>,
    /// Last `fft_size` input samples, newest hop at the tail
    history: Vec<f64>,
    /// Overlap-add ring, `fft_size - hop_size` long
    overlap: Vec<f64>,
}

struct EqPlans {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl ThreeBandEQ {
    /// Create an equalizer processing `hop_size` samples per block
    /// (FFT size is twice the hop for 50% overlap)
    pub fn new(sample_rate: f32, hop_size: usize) -> Self {
        let params = Arc::new(EqParams::new(sample_rate));
        let fft_size = hop_size * 2;

        if hop_size == 0 {
            return Self {
                params,
                sample_rate,
                hop_size,
                fft_size,
                plans: None,
                spectrum: Vec::new(),
                scratch: Vec::new(),
                window: Vec::new(),
                history: Vec::new(),
                overlap: Vec::new(),
            };
        }

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        // Hann analysis window; with 50% overlap it sums to ~unity
        let window = (0..fft_size)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f64::consts::PI * i as f64 / (fft_size - 1) as f64).cos())
            })
            .collect();

        Self {
            params,
            sample_rate,
            hop_size,
            fft_size,
            plans: Some(EqPlans { forward, inverse }),
            spectrum: vec![Complex::default(); fft_size],
            scratch: vec![Complex::default(); scratch_len],
            window,
            history: vec![0.0; fft_size],
            overlap: vec![0.0; fft_size - hop_size],
        }
    }

    pub fn with_defaults(sample_rate: f32) -> Self {
        Self::new(sample_rate, DEFAULT_EQ_HOP_SIZE)
    }

    /// Shared parameter block for the control surface
    pub fn params(&self) -> Arc<EqParams> {
        Arc::clone(&self.params)
    }

    /// Samples consumed and produced per `process()` call
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Scale each bin's magnitude by the band gain at its frequency while
    /// preserving phase, then restore Hermitian symmetry so the inverse
    /// transform stays real
    fn apply_band_gains(&mut self) {
        let half = self.fft_size / 2;
        let gains = self.params.band_gains();

        // DC belongs to the low band
        self.spectrum[0] *= f64::from(gains[0]);

        for i in 1..half {
            let frequency = i as f32 * self.sample_rate / self.fft_size as f32;
            // Gain is real and non-negative, so scaling the complex bin
            // multiplies the magnitude and leaves the phase untouched
            let gain = f64::from(self.params.smooth_gain(frequency));
            self.spectrum[i] *= gain;
            self.spectrum[self.fft_size - i] = self.spectrum[i].conj();
        }

        // Nyquist belongs to the high band
        self.spectrum[half] *= f64::from(gains[2]);
    }
}

impl AudioEffect for ThreeBandEQ {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        if !self.is_enabled() || input.is_empty() {
            output.copy_from_slice(input);
            if !self.is_enabled() {
                self.reset();
            }
            return;
        }

        // Hard precondition: exactly one hop per call. Anything else gets
        // silence, not misaligned audio.
        if input.len() != self.hop_size {
            output.fill(0.0);
            return;
        }

        let hop = self.hop_size;
        let n = self.fft_size;

        // Shift out the oldest hop, append the new one
        self.history.copy_within(hop.., 0);
        for (slot, &sample) in self.history[n - hop..].iter_mut().zip(input) {
            *slot = f64::from(sample);
        }

        // Windowed copy into the transform buffer
        for i in 0..n {
            self.spectrum[i] = Complex::new(self.history[i] * self.window[i], 0.0);
        }

        let Some(plans) = self.plans.as_ref() else {
            output.fill(0.0);
            return;
        };
        let forward = Arc::clone(&plans.forward);
        let inverse = Arc::clone(&plans.inverse);

        forward.process_with_scratch(&mut self.spectrum, &mut self.scratch);
        self.apply_band_gains();
        inverse.process_with_scratch(&mut self.spectrum, &mut self.scratch);

        // Overlap-add: accumulate the front, emit one hop, shift the ring
        let norm = n as f64;
        for i in 0..n - hop {
            self.overlap[i] += self.spectrum[i].re / norm;
        }
        for (out, &acc) in output.iter_mut().zip(self.overlap.iter()) {
            *out = acc as f32;
        }
        self.overlap.copy_within(hop.., 0);
        for i in 0..hop {
            self.overlap[n - 2 * hop + i] = self.spectrum[n - hop + i].re / norm;
        }
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.overlap.fill(0.0);
    }

    fn is_enabled(&self) -> bool {
        self.plans.is_some() && self.params.is_enabled()
    }

    fn name(&self) -> &'static str {
        "Three-Band EQ"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;
    const HOP: usize = 512;

    fn sine(amplitude: f32, freq: f32, count: usize) -> Vec<f32> {
        (0..count)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    fn run_blocks(eq: &mut ThreeBandEQ, input: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0; input.len()];
        for (inb, outb) in input.chunks(HOP).zip(output.chunks_mut(HOP)) {
            eq.process(inb, outb);
        }
        output
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0_f32, |m, &s| m.max(s.abs()))
    }

    #[test]
    fn test_disabled_passthrough_is_bit_identical() {
        let mut eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        let input = sine(0.5, 440.0, HOP);
        let mut output = vec![0.0; HOP];

        eq.process(&input, &mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn test_wrong_block_size_yields_silence() {
        let mut eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        eq.params().set_enabled(true);

        let input = sine(0.5, 440.0, HOP / 2);
        let mut output = vec![1.0; HOP / 2];
        eq.process(&input, &mut output);

        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_unity_gain_reconstructs_input() {
        // All gains at 1.0: after the startup latency (one hop) the
        // overlap-add round trip reconstructs the input
        let mut eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        eq.params().set_enabled(true);

        let input = sine(0.5, 440.0, 16 * HOP);
        let output = run_blocks(&mut eq, &input);

        // Output is delayed by exactly one hop
        let settled = 4 * HOP;
        for i in settled..input.len() - HOP {
            let expected = input[i];
            let actual = output[i + HOP];
            assert!(
                (expected - actual).abs() < 0.01,
                "sample {}: expected {}, got {}",
                i,
                expected,
                actual
            );
        }
    }

    #[test]
    fn test_low_boost_raises_low_frequency_amplitude() {
        let mut eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        eq.params().set_enabled(true);
        eq.params().set_band_gain(0, 2.0).unwrap();

        // 100Hz is well below the 250Hz*0.8 transition start
        let input = sine(0.25, 100.0, 16 * HOP);
        let output = run_blocks(&mut eq, &input);

        let steady = &output[8 * HOP..];
        assert!(
            (peak(steady) - 0.5).abs() < 0.05,
            "expected ~2x boost, peak {}",
            peak(steady)
        );
    }

    #[test]
    fn test_mid_cut_attenuates_mid_frequency() {
        let mut eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        eq.params().set_enabled(true);
        eq.params().set_band_gain(1, 0.5).unwrap();

        // 1kHz sits between 250*1.2 and 4000*0.8: pure mid band
        let input = sine(0.8, 1000.0, 16 * HOP);
        let output = run_blocks(&mut eq, &input);

        let steady = &output[8 * HOP..];
        assert!(
            (peak(steady) - 0.4).abs() < 0.05,
            "expected 0.5x cut, peak {}",
            peak(steady)
        );
    }

    #[test]
    fn test_band_gain_clamped_at_setter() {
        let eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        let params = eq.params();

        params.set_band_gain(0, 100.0).unwrap();
        assert_eq!(params.band_gain(0), 6.0);

        params.set_band_gain(0, -3.0).unwrap();
        assert_eq!(params.band_gain(0), 0.0);
    }

    #[test]
    fn test_cutoff_clamped_to_audio_range() {
        let eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        let params = eq.params();

        params.set_band_cutoff(0, 1.0).unwrap();
        assert_eq!(params.band_cutoff(0), 20.0);

        params.set_band_cutoff(1, 100_000.0).unwrap();
        assert_eq!(params.band_cutoff(1), SAMPLE_RATE / 2.0);
    }

    #[test]
    fn test_invalid_indices_are_errors() {
        let eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        assert!(eq.params().set_band_gain(3, 1.0).is_err());
        assert!(eq.params().set_band_cutoff(2, 1000.0).is_err());
    }

    #[test]
    fn test_smooth_gain_is_continuous_across_transition() {
        let eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        let params = eq.params();
        params.set_band_gain(0, 2.0).unwrap();
        params.set_band_gain(1, 1.0).unwrap();

        // March across the low/mid transition in small steps; no jumps
        let mut prev = params.smooth_gain(150.0);
        let mut freq = 150.0;
        while freq < 400.0 {
            let gain = params.smooth_gain(freq);
            assert!((gain - prev).abs() < 0.05, "jump at {}Hz", freq);
            prev = gain;
            freq += 1.0;
        }

        // Endpoints are the plain band gains
        assert_eq!(params.smooth_gain(150.0), 2.0);
        assert_eq!(params.smooth_gain(1000.0), 1.0);
    }

    #[test]
    fn test_zero_hop_disables_permanently() {
        let mut eq = ThreeBandEQ::new(SAMPLE_RATE, 0);
        eq.params().set_enabled(true);
        assert!(!eq.is_enabled());

        let input = [0.5_f32; 4];
        let mut output = [0.0_f32; 4];
        eq.process(&input, &mut output);
        assert_eq!(input, output);
    }

    #[test]
    fn test_reset_clears_overlap_state() {
        let mut eq = ThreeBandEQ::new(SAMPLE_RATE, HOP);
        eq.params().set_enabled(true);

        let input = sine(0.5, 440.0, 4 * HOP);
        run_blocks(&mut eq, &input);

        eq.reset();

        // Silence in should now mean silence out, with no tail from the
        // previous signal
        let silence = vec![0.0_f32; HOP];
        let mut output = vec![1.0_f32; HOP];
        eq.process(&silence, &mut output);
        assert!(peak(&output) < 1e-9);
    }
}
