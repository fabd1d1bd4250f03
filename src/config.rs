//! Decoder configuration
//!
//! ```yaml
//! poll_interval_ms: 100
//! max_source_errors: 10
//! replay:
//!   chunk_size: 256
//!   interval_ms: 0
//! ```
//!
//! Every key is optional.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Result, TelemetryError};

/// Replay pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Bytes handed to the decoder per read
    pub chunk_size: usize,
    /// Delay between chunks; 0 replays as fast as possible
    pub interval_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { chunk_size: 256, interval_ms: 0 }
    }
}

impl ReplayConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Store worker wake-up period when the queue stays quiet
    pub poll_interval_ms: u64,
    /// Consecutive source errors tolerated before the decode task gives up
    pub max_source_errors: u32,
    pub replay: ReplayConfig,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 100, max_source_errors: 10, replay: ReplayConfig::default() }
    }
}

impl DecoderConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(TelemetryError::config("decoder config", "poll_interval_ms must be positive"));
        }
        if self.replay.chunk_size == 0 {
            return Err(TelemetryError::config("decoder config", "replay.chunk_size must be positive"));
        }
        if self.max_source_errors == 0 {
            return Err(TelemetryError::config("decoder config", "max_source_errors must be positive"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
