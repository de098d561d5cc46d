//! Real-Time Boundary
//!
//! The low-level CPAL stream setup and the real-time audio callbacks.
//!
//! # Audio Flow
//!
//! ```text
//! Capture callback:  device frame -> input queue (one blocking push)
//! Playback callback: output queue (one blocking pop) -> device frame
//! ```
//!
//! Each callback performs exactly one queue operation per invocation.
//! The push/pop may block briefly when the pipeline lags; the bounded
//! queues are the backpressure control, so stalling the callback here is
//! the intended failure mode rather than unbounded buffering. The
//! capture side allocates one `Vec` per frame to hand ownership across
//! the queue.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig as CpalStreamConfig};
use crossbeam_channel::Sender;
use tracing::info;

use crate::config::StreamConfig;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::queue::BufferQueue;

/// Owns the capture and playback streams for one device pair
///
/// Dropping this stops both callbacks; the CPAL streams are held only to
/// keep audio flowing.
pub struct RealtimeBoundary {
    #[allow(dead_code)]
    capture_stream: Stream,

    #[allow(dead_code)]
    output_stream: Stream,

    /// Configuration the streams were opened with
    pub config: StreamConfig,
}

impl RealtimeBoundary {
    /// Open capture and playback streams bridged by the two frame queues
    ///
    /// The capture callback pushes each device frame onto `input_queue`;
    /// the playback callback pops a processed frame from `output_queue`.
    /// An empty or shut-down output queue yields silence plus a
    /// [`Event::BufferUnderrun`], never a blocked device.
    pub fn new(
        config: StreamConfig,
        capture_device: &Device,
        output_device: &Device,
        input_queue: Arc<BufferQueue>,
        output_queue: Arc<BufferQueue>,
        event_sender: Sender<Event>,
    ) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        let cpal_config = CpalStreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let capture_stream = Self::build_capture_stream(
            capture_device,
            &cpal_config,
            input_queue,
            event_sender.clone(),
        )?;

        let output_stream = Self::build_output_stream(
            output_device,
            &cpal_config,
            output_queue,
            event_sender,
        )?;

        capture_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            buffer_size = config.buffer_size,
            "realtime boundary streams playing"
        );

        Ok(Self {
            capture_stream,
            output_stream,
            config,
        })
    }

    fn build_capture_stream(
        device: &Device,
        config: &CpalStreamConfig,
        input_queue: Arc<BufferQueue>,
        event_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        let stream = device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Blocks while the input queue is full; after shutdown
                    // the push returns immediately, dropping the frame
                    input_queue.push(data.to_vec());
                },
                move |err| {
                    let _ = event_sender.try_send(Event::error(err));
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(stream)
    }

    fn build_output_stream(
        device: &Device,
        config: &CpalStreamConfig,
        output_queue: Arc<BufferQueue>,
        event_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        let err_sender = event_sender.clone();

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    match output_queue.pop() {
                        Some(frame) if frame.len() == data.len() => {
                            data.copy_from_slice(&frame);
                        }
                        Some(_) | None => {
                            // Queue shut down, or the device asked for a
                            // size the pipeline never produced
                            data.fill(0.0);
                            let _ = event_sender.try_send(Event::BufferUnderrun);
                        }
                    }
                },
                move |err| {
                    let _ = err_sender.try_send(Event::error(err));
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(stream)
    }
}
