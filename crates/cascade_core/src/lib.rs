//! Cascade Core - Streaming Audio Engine
//!
//! This crate provides the threaded engine around the `cascade_dsp`
//! effect chain:
//! - Bounded blocking frame queues between the real-time callbacks and
//!   the processing worker
//! - The fixed effect chain (gate -> EQ -> de-esser -> limiter) and its
//!   worker thread
//! - CPAL capture/playback streams bridged by the queues
//! - A command/event surface for control threads
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Control Thread                          │
//! │   Command ──▶ AudioEngine ──events (crossbeam)──▶ caller    │
//! │                    │ atomic parameter stores                │
//! └────────────────────┼────────────────────────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Capture callback ──▶ BufferQueue ──▶ Pipeline worker       │
//! │                                          │ effect chain     │
//! │  Playback callback ◀── BufferQueue ◀─────┘                  │
//! │        (bounded queues = backpressure, one op per callback) │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod boundary;
mod config;
mod engine;
mod error;
mod message;
mod pipeline;
mod queue;

pub use boundary::RealtimeBoundary;
pub use config::{EngineConfig, StreamConfig};
pub use engine::AudioEngine;
pub use error::{EngineError, EngineResult};
pub use message::{Command, Event};
pub use pipeline::{ChainHandles, EffectChain, Pipeline};
pub use queue::{AudioFrame, BufferQueue, DEFAULT_QUEUE_CAPACITY};

// Re-export DSP types for convenience
pub use cascade_dsp::{
    AudioEffect, DeEsser, DeEsserParams, DspError, EqParams, GateParams, Limiter, LimiterParams,
    NoiseGate, ThreeBandEQ, NUM_BANDS, NUM_EQ_BANDS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _config = EngineConfig::default();
        let _queue = BufferQueue::with_capacity(DEFAULT_QUEUE_CAPACITY);
    }
}
