//! Processing Pipeline
//!
//! The fixed effect chain and the worker thread that drives frames
//! through it. Chain order is deliberate: the gate removes noise before
//! any spectral shaping, and dynamics control runs last so it catches
//! peaks boosted by the EQ or de-esser.
//!
//! The worker's only suspension points are the queue `pop`/`push`; a
//! `None` pop is the normal shutdown signal, not an error, so the thread
//! is guaranteed to observe shutdown within one queue-wait cycle.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use cascade_dsp::{
    AudioEffect, DeEsser, DeEsserParams, EqParams, GateParams, Limiter, LimiterParams, NoiseGate,
    ThreeBandEQ,
};

use crate::config::StreamConfig;
use crate::error::{EngineError, EngineResult};
use crate::queue::{AudioFrame, BufferQueue};

/// Shared parameter blocks for every effect in the chain
///
/// Clones of these `Arc`s are all a control surface needs: every setter
/// is an atomic store, safe to call while the worker is mid-frame.
#[derive(Clone)]
pub struct ChainHandles {
    pub gate: Arc<GateParams>,
    pub eq: Arc<EqParams>,
    pub de_esser: Arc<DeEsserParams>,
    pub limiter: Arc<LimiterParams>,
}

/// The fixed-order effect chain: gate -> EQ -> de-esser -> limiter
///
/// Owns one instance of each effect plus the scratch buffers between
/// stages; moved onto the worker thread at spawn.
pub struct EffectChain {
    gate: NoiseGate,
    eq: ThreeBandEQ,
    de_esser: DeEsser,
    limiter: Limiter,
    stage_a: Vec<f32>,
    stage_b: Vec<f32>,
}

impl EffectChain {
    /// Build a chain sized for the stream's nominal frame
    ///
    /// The EQ's hop size is pinned to the interleaved samples-per-frame,
    /// so in steady state every callback frame meets its exact-size
    /// precondition.
    pub fn new(stream: &StreamConfig) -> Self {
        let sample_rate = stream.sample_rate as f32;
        let frame_samples = stream.samples_per_frame();

        Self {
            gate: NoiseGate::with_defaults(sample_rate),
            eq: ThreeBandEQ::new(sample_rate, frame_samples),
            de_esser: DeEsser::new(sample_rate),
            limiter: Limiter::with_defaults(sample_rate),
            stage_a: vec![0.0; frame_samples],
            stage_b: vec![0.0; frame_samples],
        }
    }

    /// Parameter handles for the control surface
    pub fn handles(&self) -> ChainHandles {
        ChainHandles {
            gate: self.gate.params(),
            eq: self.eq.params(),
            de_esser: self.de_esser.params(),
            limiter: self.limiter.params(),
        }
    }

    /// Run one frame through the whole chain in place
    pub fn process(&mut self, frame: &mut AudioFrame) {
        let len = frame.len();
        if len == 0 {
            return;
        }
        if self.stage_a.len() != len {
            self.stage_a.resize(len, 0.0);
            self.stage_b.resize(len, 0.0);
        }

        // Each disabled effect (the de-esser is disabled by default) is a
        // bit-exact passthrough, so the chain cost tracks what is enabled
        self.gate.process(frame, &mut self.stage_a);
        self.eq.process(&self.stage_a, &mut self.stage_b);
        self.de_esser.process(&self.stage_b, &mut self.stage_a);
        self.limiter.process(&self.stage_a, frame);
    }

    /// Clear every effect's envelope/overlap state
    pub fn reset(&mut self) {
        self.gate.reset();
        self.eq.reset();
        self.de_esser.reset();
        self.limiter.reset();
    }
}

/// Handle to the pipeline worker thread
pub struct Pipeline {
    handle: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Spawn the worker: pop from `input`, process, push to `output`
    ///
    /// The loop exits cleanly when `input.pop()` returns `None` (both
    /// queues must be shut down by the owner; pushes after output
    /// shutdown are silently dropped, acceptable during teardown only).
    pub fn spawn(
        mut chain: EffectChain,
        input: Arc<BufferQueue>,
        output: Arc<BufferQueue>,
    ) -> EngineResult<Self> {
        let handle = thread::Builder::new()
            .name("cascade-pipeline".into())
            .spawn(move || {
                info!("pipeline worker started");
                while let Some(mut frame) = input.pop() {
                    chain.process(&mut frame);
                    output.push(frame);
                }
                debug!("input queue shut down, pipeline worker exiting");
            })
            .map_err(|e| EngineError::ThreadSpawnError(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the worker to exit (call after shutting down the queues)
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("pipeline worker panicked");
            }
        }
    }
}
