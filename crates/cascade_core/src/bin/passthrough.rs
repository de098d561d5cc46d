//! Live passthrough demo
//!
//! Opens the default capture and playback devices, runs the full effect
//! chain between them for a few seconds with the gate and limiter
//! enabled, and prints engine events. Run with `RUST_LOG=debug` for the
//! worker's view.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cascade_core::{AudioEngine, Command, EngineConfig, Event};

const RUN_FOR: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::default();
    info!(
        latency_ms = config.stream.latency_ms(),
        "starting passthrough"
    );

    let (mut engine, events) = AudioEngine::new(config);
    engine.start()?;

    engine.apply_command(Command::SetGateEnabled(true))?;
    engine.apply_command(Command::SetGateThreshold(0.02))?;
    engine.apply_command(Command::SetLimiterEnabled(true))?;
    engine.apply_command(Command::SetLimiterThreshold(0.8))?;

    let deadline = Instant::now() + RUN_FOR;
    let mut underruns = 0u32;
    while Instant::now() < deadline {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(Event::BufferUnderrun) => underruns += 1,
            Ok(Event::Error { message }) => info!("stream error: {message}"),
            Ok(event) => info!(?event, "engine event"),
            Err(_) => {}
        }
    }

    engine.stop();
    info!(underruns, "passthrough finished");
    Ok(())
}
