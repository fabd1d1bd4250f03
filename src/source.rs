//! Byte source trait for downlink data

use crate::Result;

/// Trait for raw downlink byte sources
///
/// Sources hand out chunks of an unframed byte stream. Chunk boundaries carry no
/// meaning; the decoder cuts frames itself. Each source handles its own timing.
#[async_trait::async_trait]
pub trait ByteSource: Send + 'static {
    /// Get the next chunk of bytes
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` - more data, possibly empty
    /// - `Ok(None)` - stream ended (normal termination)
    /// - `Err(e)` - read failed; the caller may retry
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}
