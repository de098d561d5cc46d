//! Message Types for Thread Communication
//!
//! Commands flow from the control surface -> engine.
//! Events flow from the engine/audio threads -> control surface.

use serde::{Deserialize, Serialize};

/// Commands sent from the control surface to the engine
#[derive(Debug, Clone)]
pub enum Command {
    /// Start audio processing
    Start,

    /// Stop audio processing
    Stop,

    /// Stop (if running) and shut down the engine
    Shutdown,

    // Noise gate
    SetGateEnabled(bool),
    /// Gate threshold, 0.0 - 1.0 (lower = more passes)
    SetGateThreshold(f32),
    SetGateAttackMs(f32),
    SetGateReleaseMs(f32),

    // Three-band EQ
    SetEqEnabled(bool),
    /// Linear band gain 0.0 - 6.0 (0 = low, 1 = mid, 2 = high)
    SetEqBandGain { band: usize, gain: f32 },
    /// Crossover frequency in Hz (0 = low/mid, 1 = mid/high)
    SetEqBandCutoff { index: usize, frequency: f32 },

    // De-esser
    SetDeEsserEnabled(bool),
    /// Attenuation band in Hz; start must be below end
    SetDeEsserBand { start_hz: f32, end_hz: f32 },
    SetDeEsserReductionDb(f32),

    // Limiter
    SetLimiterEnabled(bool),
    /// Peak ceiling, 0.0 - 1.0
    SetLimiterThreshold(f32),
    SetLimiterAttackMs(f32),
    SetLimiterReleaseMs(f32),
}

/// Events sent from the engine to the control surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Engine started successfully
    Started,

    /// Engine stopped
    Stopped,

    /// Error occurred
    Error { message: String },

    /// Output underrun: the playback callback found no processed frame
    /// (or a wrong-sized one) and substituted silence
    BufferUnderrun,
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = Event::BufferUnderrun;
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("BufferUnderrun"));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert!(matches!(deserialized, Event::BufferUnderrun));
    }

    #[test]
    fn test_error_event() {
        let event = Event::error("Test error message");
        if let Event::Error { message } = event {
            assert_eq!(message, "Test error message");
        } else {
            panic!("Should be Error variant");
        }
    }
}
