//! Frame boundary detection over chunked byte streams

use std::mem;
use std::sync::Arc;
use tracing::trace;

use crate::frame::{Frame, FrameFormat};
use crate::spacecraft::SpacecraftDirectory;

/// Cuts a continuous byte stream into consecutive frames of format `F`.
///
/// Chunks may split frames anywhere. A frame is returned as soon as its last byte has
/// been pushed, whether or not it decoded.
pub struct Deframer<F: FrameFormat> {
    directory: Arc<dyn SpacecraftDirectory>,
    current: Frame<F>,
    completed: u64,
}

impl<F: FrameFormat> Deframer<F> {
    pub fn new(directory: Arc<dyn SpacecraftDirectory>) -> Self {
        let current = Frame::new(Arc::clone(&directory));
        Self { directory, current, completed: 0 }
    }

    /// Feed a chunk and collect every frame it completes.
    pub fn push(&mut self, mut chunk: &[u8]) -> Vec<Frame<F>> {
        let mut frames = Vec::new();
        while !chunk.is_empty() {
            let taken = self.current.feed_all(chunk);
            chunk = &chunk[taken..];
            if self.current.is_complete() {
                let next = Frame::new(Arc::clone(&self.directory));
                frames.push(mem::replace(&mut self.current, next));
                self.completed += 1;
            }
        }
        if !frames.is_empty() {
            trace!(format = F::NAME, frames = frames.len(), pending = self.pending_bytes(), "Chunk deframed");
        }
        frames
    }

    /// Bytes of the frame currently being assembled.
    pub fn pending_bytes(&self) -> usize {
        self.current.bytes_consumed()
    }

    /// Frames completed since creation.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Drop the partial frame, e.g. after a gap in the stream.
    pub fn reset(&mut self) {
        self.current = Frame::new(Arc::clone(&self.directory));
    }

    /// The partial frame, if any bytes of it were seen.
    pub fn into_partial(self) -> Option<Frame<F>> {
        (self.current.bytes_consumed() > 0).then_some(self.current)
    }
}
