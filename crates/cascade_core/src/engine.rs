//! Audio Engine - Main Entry Point
//!
//! The AudioEngine owns the frame queues, the pipeline worker, and
//! (optionally) the hardware boundary, and translates [`Command`]s into
//! atomic parameter updates on the running effect chain.
//!
//! # Lifecycle
//!
//! `start_processing()` brings up the queues and the worker thread
//! without touching audio hardware; frames can then be driven through
//! `input_queue()`/`output_queue()` directly, which is how the engine is
//! exercised offline and in tests. `start()` additionally opens the
//! default capture/playback devices. `stop()` tears everything down in
//! dependency order: boundary first (so the callbacks stop touching the
//! queues), then queue shutdown, then worker join.

use std::sync::Arc;

use cpal::traits::HostTrait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{info, warn};

use crate::boundary::RealtimeBoundary;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use crate::pipeline::{ChainHandles, EffectChain, Pipeline};
use crate::queue::BufferQueue;

/// Everything that exists only while the engine is running
struct Running {
    input_queue: Arc<BufferQueue>,
    output_queue: Arc<BufferQueue>,
    pipeline: Option<Pipeline>,
    handles: ChainHandles,
    boundary: Option<RealtimeBoundary>,
}

/// The main audio engine controller
///
/// Lives on the control thread. All parameter commands are lock-free
/// atomic stores on the chain's shared parameter blocks, so they are
/// safe at any time while the engine runs.
pub struct AudioEngine {
    config: EngineConfig,
    event_sender: Sender<Event>,
    running: Option<Running>,
}

impl AudioEngine {
    /// Create an engine and the event channel the caller drains
    pub fn new(config: EngineConfig) -> (Self, Receiver<Event>) {
        let (event_sender, event_receiver) = unbounded::<Event>();
        (
            Self {
                config,
                event_sender,
                running: None,
            },
            event_receiver,
        )
    }

    /// Bring up the queues and the pipeline worker, without hardware
    ///
    /// After this returns, frames pushed to [`input_queue`](Self::input_queue)
    /// come out processed on [`output_queue`](Self::output_queue).
    pub fn start_processing(&mut self) -> EngineResult<()> {
        if self.running.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        self.config
            .stream
            .validate()
            .map_err(EngineError::ConfigError)?;

        let input_queue = Arc::new(BufferQueue::with_capacity(self.config.queue_capacity));
        let output_queue = Arc::new(BufferQueue::with_capacity(self.config.queue_capacity));

        let chain = EffectChain::new(&self.config.stream);
        let handles = chain.handles();
        let pipeline = Pipeline::spawn(
            chain,
            Arc::clone(&input_queue),
            Arc::clone(&output_queue),
        )?;

        info!(
            latency_ms = self.config.stream.latency_ms(),
            queue_capacity = self.config.queue_capacity,
            "processing started"
        );

        self.running = Some(Running {
            input_queue,
            output_queue,
            pipeline: Some(pipeline),
            handles,
            boundary: None,
        });
        let _ = self.event_sender.send(Event::Started);
        Ok(())
    }

    /// Start full live processing on the default capture/playback devices
    pub fn start(&mut self) -> EngineResult<()> {
        self.start_processing()?;

        let host = cpal::default_host();
        let capture_device = host.default_input_device();
        let output_device = host.default_output_device();
        let (capture_device, output_device) = match (capture_device, output_device) {
            (Some(c), Some(o)) => (c, o),
            _ => {
                self.teardown();
                return Err(EngineError::NoDevicesFound);
            }
        };

        let running = match self.running.as_mut() {
            Some(r) => r,
            None => return Err(EngineError::NotRunning),
        };

        let boundary = RealtimeBoundary::new(
            self.config.stream.clone(),
            &capture_device,
            &output_device,
            Arc::clone(&running.input_queue),
            Arc::clone(&running.output_queue),
            self.event_sender.clone(),
        );

        match boundary {
            Ok(b) => {
                running.boundary = Some(b);
                info!("audio engine started on default devices");
                Ok(())
            }
            Err(e) => {
                self.teardown();
                Err(e)
            }
        }
    }

    /// Stop processing and join the worker; idempotent
    pub fn stop(&mut self) {
        if self.running.is_some() {
            info!("stopping audio engine");
            self.teardown();
            let _ = self.event_sender.send(Event::Stopped);
        }
    }

    /// Whether the engine is currently running
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Queue the capture side feeds (present while running)
    pub fn input_queue(&self) -> Option<Arc<BufferQueue>> {
        self.running.as_ref().map(|r| Arc::clone(&r.input_queue))
    }

    /// Queue the playback side drains (present while running)
    pub fn output_queue(&self) -> Option<Arc<BufferQueue>> {
        self.running.as_ref().map(|r| Arc::clone(&r.output_queue))
    }

    /// Current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Route a control command to the running chain
    ///
    /// Parameter commands are single atomic stores; the worker picks the
    /// new value up on its next frame. Validation failures (bad band
    /// index, inverted frequency band) surface as `Err` without touching
    /// the chain.
    pub fn apply_command(&mut self, command: Command) -> EngineResult<()> {
        match command {
            Command::Start => return self.start(),
            Command::Stop | Command::Shutdown => {
                self.stop();
                return Ok(());
            }
            _ => {}
        }

        let handles = match self.running.as_ref() {
            Some(r) => &r.handles,
            None => return Err(EngineError::NotRunning),
        };

        match command {
            Command::SetGateEnabled(enabled) => handles.gate.set_enabled(enabled),
            Command::SetGateThreshold(threshold) => handles.gate.set_threshold(threshold),
            Command::SetGateAttackMs(ms) => handles.gate.set_attack_ms(ms),
            Command::SetGateReleaseMs(ms) => handles.gate.set_release_ms(ms),

            Command::SetEqEnabled(enabled) => handles.eq.set_enabled(enabled),
            Command::SetEqBandGain { band, gain } => handles.eq.set_band_gain(band, gain)?,
            Command::SetEqBandCutoff { index, frequency } => {
                handles.eq.set_band_cutoff(index, frequency)?
            }

            Command::SetDeEsserEnabled(enabled) => handles.de_esser.set_enabled(enabled),
            Command::SetDeEsserBand { start_hz, end_hz } => {
                handles.de_esser.set_band(start_hz, end_hz)?
            }
            Command::SetDeEsserReductionDb(db) => handles.de_esser.set_reduction_db(db),

            Command::SetLimiterEnabled(enabled) => handles.limiter.set_enabled(enabled),
            Command::SetLimiterThreshold(threshold) => handles.limiter.set_threshold(threshold),
            Command::SetLimiterAttackMs(ms) => handles.limiter.set_attack_ms(ms),
            Command::SetLimiterReleaseMs(ms) => handles.limiter.set_release_ms(ms),

            // Lifecycle commands handled above
            Command::Start | Command::Stop | Command::Shutdown => unreachable!(),
        }
        Ok(())
    }

    /// Drop the boundary, shut down the queues, join the worker
    fn teardown(&mut self) {
        if let Some(mut running) = self.running.take() {
            // Boundary first: callbacks must stop touching the queues
            // before shutdown wakes them into drop-frame mode
            running.boundary = None;
            running.input_queue.shutdown();
            running.output_queue.shutdown();
            if let Some(pipeline) = running.pipeline.take() {
                pipeline.join();
            }
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        if self.running.is_some() {
            warn!("engine dropped while running, forcing teardown");
            self.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;

    fn small_config() -> EngineConfig {
        EngineConfig {
            stream: StreamConfig {
                sample_rate: 48000,
                channels: 1,
                buffer_size: 256,
            },
            queue_capacity: 4,
        }
    }

    #[test]
    fn test_start_processing_and_stop() {
        let (mut engine, events) = AudioEngine::new(small_config());
        assert!(!engine.is_running());

        engine.start_processing().unwrap();
        assert!(engine.is_running());
        assert!(matches!(events.try_recv(), Ok(Event::Started)));

        engine.stop();
        assert!(!engine.is_running());
        assert!(matches!(events.try_recv(), Ok(Event::Stopped)));
    }

    #[test]
    fn test_double_start_is_rejected() {
        let (mut engine, _events) = AudioEngine::new(small_config());
        engine.start_processing().unwrap();
        assert!(matches!(
            engine.start_processing(),
            Err(EngineError::AlreadyRunning)
        ));
        engine.stop();
    }

    #[test]
    fn test_stop_when_not_running_is_noop() {
        let (mut engine, events) = AudioEngine::new(small_config());
        engine.stop();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_invalid_stream_config_rejected() {
        let config = EngineConfig {
            stream: StreamConfig {
                sample_rate: 100,
                ..Default::default()
            },
            queue_capacity: 4,
        };
        let (mut engine, _events) = AudioEngine::new(config);
        assert!(matches!(
            engine.start_processing(),
            Err(EngineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_commands_require_running_engine() {
        let (mut engine, _events) = AudioEngine::new(small_config());
        assert!(matches!(
            engine.apply_command(Command::SetGateEnabled(true)),
            Err(EngineError::NotRunning)
        ));
    }

    #[test]
    fn test_parameter_commands_reach_the_chain() {
        let (mut engine, _events) = AudioEngine::new(small_config());
        engine.start_processing().unwrap();

        engine.apply_command(Command::SetGateEnabled(true)).unwrap();
        engine
            .apply_command(Command::SetLimiterThreshold(0.3))
            .unwrap();
        engine
            .apply_command(Command::SetEqBandGain { band: 0, gain: 2.0 })
            .unwrap();

        // Invalid band index surfaces as a DSP error
        assert!(matches!(
            engine.apply_command(Command::SetEqBandGain { band: 7, gain: 1.0 }),
            Err(EngineError::Dsp(_))
        ));
        // Inverted de-esser band is rejected
        assert!(matches!(
            engine.apply_command(Command::SetDeEsserBand {
                start_hz: 9000.0,
                end_hz: 4000.0
            }),
            Err(EngineError::Dsp(_))
        ));

        engine.stop();
    }

    #[test]
    fn test_frames_flow_through_running_engine() {
        let (mut engine, _events) = AudioEngine::new(small_config());
        engine.start_processing().unwrap();

        let input = engine.input_queue().unwrap();
        let output = engine.output_queue().unwrap();
        let frame_len = engine.config().stream.samples_per_frame();

        input.push(vec![0.25; frame_len]);
        let processed = output.pop().unwrap();
        assert_eq!(processed.len(), frame_len);
        // All effects start disabled: bit-exact passthrough
        assert_eq!(processed[0], 0.25);

        engine.stop();
    }

    #[test]
    fn test_shutdown_command_stops_engine() {
        let (mut engine, _events) = AudioEngine::new(small_config());
        engine.start_processing().unwrap();
        engine.apply_command(Command::Shutdown).unwrap();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_drop_while_running_joins_worker() {
        let (mut engine, _events) = AudioEngine::new(small_config());
        engine.start_processing().unwrap();
        // Drop must not hang or leak the worker thread
        drop(engine);
    }
}
