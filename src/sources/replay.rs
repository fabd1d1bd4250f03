//! Replay source for recorded downlink files

use std::path::Path;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::config::ReplayConfig;
use crate::source::ByteSource;
use crate::{Result, TelemetryError};

/// Replays a recorded byte stream in fixed-size chunks.
pub struct ReplaySource {
    data: Vec<u8>,
    position: usize,
    chunk_size: usize,
    /// Chunk pacing; `None` replays as fast as the decoder reads
    interval: Option<Interval>,
}

impl ReplaySource {
    /// Load a recording from disk.
    pub fn open<P: AsRef<Path>>(path: P, config: &ReplayConfig) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        info!("Opened recording {}: {} bytes", path.display(), data.len());
        Ok(Self::from_bytes(data, config))
    }

    /// Replay bytes already in memory.
    ///
    /// Must be called inside a tokio runtime when pacing is configured.
    pub fn from_bytes(data: Vec<u8>, config: &ReplayConfig) -> Self {
        let interval = config.interval().map(|period| {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        Self { data, position: 0, chunk_size: config.chunk_size.max(1), interval }
    }

    /// Total bytes in the recording.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes already handed out.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[async_trait::async_trait]
impl ByteSource for ReplaySource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.position >= self.data.len() {
            debug!("Reached end of recording");
            return Ok(None);
        }

        if let Some(interval) = self.interval.as_mut() {
            interval.tick().await;
        }

        let end = (self.position + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        trace!("Chunk {}..{} of {}", end - chunk.len(), end, self.data.len());
        Ok(Some(chunk))
    }
}
