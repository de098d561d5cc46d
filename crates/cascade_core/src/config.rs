//! Engine and Stream Configuration

use serde::{Deserialize, Serialize};

use crate::queue::DEFAULT_QUEUE_CAPACITY;

/// Audio stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Buffer size in frames per callback (lower = less latency)
    pub buffer_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            buffer_size: 1024,
        }
    }
}

impl StreamConfig {
    /// Interleaved samples exchanged per callback invocation
    pub fn samples_per_frame(&self) -> usize {
        self.buffer_size as usize * self.channels as usize
    }

    /// Calculate latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.channels == 0 || self.channels > 8 {
            return Err(format!("Invalid channel count: {}", self.channels));
        }
        if self.buffer_size < 32 || self.buffer_size > 8192 {
            return Err(format!("Invalid buffer size: {}", self.buffer_size));
        }
        Ok(())
    }
}

/// Overall engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stream configuration
    pub stream: StreamConfig,

    /// Capacity bound of each frame queue (the backpressure control)
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 2);
        assert_eq!(config.buffer_size, 1024);
    }

    #[test]
    fn test_samples_per_frame() {
        let config = StreamConfig::default();
        assert_eq!(config.samples_per_frame(), 2048);

        let mono = StreamConfig {
            channels: 1,
            ..Default::default()
        };
        assert_eq!(mono.samples_per_frame(), 1024);
    }

    #[test]
    fn test_latency_calculation() {
        let config = StreamConfig {
            sample_rate: 48000,
            channels: 2,
            buffer_size: 480, // Exactly 10ms at 48kHz
        };
        let latency = config.latency_ms();
        assert!((latency - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_validation() {
        assert!(StreamConfig::default().validate().is_ok());

        let invalid_rate = StreamConfig {
            sample_rate: 100,
            ..Default::default()
        };
        assert!(invalid_rate.validate().is_err());

        let invalid_channels = StreamConfig {
            channels: 0,
            ..Default::default()
        };
        assert!(invalid_channels.validate().is_err());

        let invalid_buffer = StreamConfig {
            buffer_size: 10,
            ..Default::default()
        };
        assert!(invalid_buffer.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.stream.sample_rate, deserialized.stream.sample_rate);
        assert_eq!(config.queue_capacity, deserialized.queue_capacity);
    }
}
