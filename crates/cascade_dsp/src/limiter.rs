//! Peak Limiter
//!
//! Sample-domain dynamic gain reducer. Whenever the instantaneous input
//! magnitude exceeds the threshold the gain is pulled down toward
//! `threshold / |input|` at attack speed; once the signal falls back below
//! the threshold the gain recovers toward unity at release speed. No
//! lookahead, no buffering beyond the current sample.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::effect::{smoothing_coeff, AtomicF32, AudioEffect, TIME_EPSILON};

const MIN_ATTACK_MS: f32 = 0.1;
const MIN_RELEASE_MS: f32 = 1.0;

const DEFAULT_THRESHOLD: f32 = 0.02;
const DEFAULT_ATTACK_MS: f32 = 5.0;
const DEFAULT_RELEASE_MS: f32 = 100.0;

/// Shared, atomically tunable limiter parameters
pub struct LimiterParams {
    enabled: AtomicBool,
    threshold: AtomicF32,
    attack_ms: AtomicF32,
    release_ms: AtomicF32,
    attack_coeff: AtomicF32,
    release_coeff: AtomicF32,
    sample_rate: f32,
}

impl LimiterParams {
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

    /// Set the peak ceiling (clamped to 0.0 - 1.0)
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

/// Peak-following limiter
pub struct Limiter {
    params: Arc<LimiterParams>,
    current_gain: f32,
}

impl Limiter {
    pub fn new(sample_rate: f32, threshold: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            params: Arc::new(LimiterParams::new(
                sample_rate,
                threshold,
                attack_ms,
                release_ms,
            )),
            current_gain: 1.0,
        }
    }

    pub fn with_defaults(sample_rate: f32) -> Self {
        Self::new(
            sample_rate,
            DEFAULT_THRESHOLD,
            DEFAULT_ATTACK_MS,
            DEFAULT_RELEASE_MS,
        )
    }

    /// Shared parameter block for the control surface
    pub fn params(&self) -> Arc<LimiterParams> {
        Arc::clone(&self.params)
    }

    /// Current gain reduction envelope (1 = no reduction)
    pub fn current_gain(&self) -> f32 {
        self.current_gain
    }
}

impl AudioEffect for Limiter {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        if !self.is_enabled() || input.is_empty() {
            output.copy_from_slice(input);
            if !self.is_enabled() {
                // Unity gain is the safe bypass value, so re-enabling
                // starts with no pending reduction
                self.reset();
            }
            return;
        }

        let threshold = self.params.threshold();
        let attack = self.params.attack_coeff.load();
        let release = self.params.release_coeff.load();

        for (out, &sample) in output.iter_mut().zip(input) {
            let magnitude = sample.abs();
            let target = if magnitude <= threshold {
                1.0
            } else {
                threshold / (magnitude + TIME_EPSILON)
            };

            if target < self.current_gain {
                // Limiting harder: attack speed, clamped at the target
                self.current_gain = attack * self.current_gain + (1.0 - attack) * target;
                self.current_gain = self.current_gain.max(target);
            } else {
                // Recovering: release speed, never past unity
                self.current_gain = release * self.current_gain + (1.0 - release) * target;
                self.current_gain = self.current_gain.min(1.0);
            }

            *out = sample * self.current_gain;
        }
    }

    fn reset(&mut self) {
        self.current_gain = 1.0;
    }

    fn is_enabled(&self) -> bool {
        self.params.is_enabled()
    }

    fn name(&self) -> &'static str {
        "Limiter"
    }
}
