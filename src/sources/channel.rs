//! Channel-fed source for live receivers

use tokio::sync::mpsc;
use tracing::debug;

use crate::Result;
use crate::source::ByteSource;

/// Source fed by another task, typically a demodulator.
///
/// The stream ends when every sender has been dropped.
pub struct ChannelSource {
    receiver: mpsc::Receiver<Vec<u8>>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new(buffer: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (sender, Self { receiver })
    }
}

#[async_trait::async_trait]
impl ByteSource for ChannelSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self.receiver.recv().await;
        if chunk.is_none() {
            debug!("All senders dropped, channel source ended");
        }
        Ok(chunk)
    }
}
