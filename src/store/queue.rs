//! Unbounded FIFO between the decoder and the store worker

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::trace;

use crate::payload::PayloadSegment;
use crate::types::SpacecraftStamp;

/// A segment waiting to be stored, with the header identity it was decoded under.
#[derive(Debug)]
pub struct QueueEntry {
    pub stamp: SpacecraftStamp,
    pub segment: PayloadSegment,
}

impl QueueEntry {
    pub fn new(stamp: SpacecraftStamp, segment: PayloadSegment) -> Self {
        Self { stamp, segment }
    }
}

#[derive(Debug, Default)]
struct Shared {
    entries: Mutex<VecDeque<QueueEntry>>,
    notify: Notify,
}

/// Ordered, thread-safe, unbounded queue of decoded segments.
///
/// Cloning yields another handle to the same queue. Adding never blocks and never
/// rejects.
#[derive(Debug, Clone, Default)]
pub struct PersistenceQueue {
    shared: Arc<Shared>,
}

impl PersistenceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: QueueEntry) {
        self.lock().push_back(entry);
        self.shared.notify.notify_one();
    }

    /// Append entries contiguously under a single lock.
    pub fn add_all(&self, entries: impl IntoIterator<Item = QueueEntry>) {
        let added = {
            let mut queue = self.lock();
            let before = queue.len();
            queue.extend(entries);
            queue.len() - before
        };
        if added > 0 {
            trace!(added, "Segments queued");
            self.shared.notify.notify_one();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything queued, oldest first.
    pub(crate) fn drain(&self) -> Vec<QueueEntry> {
        self.lock().drain(..).collect()
    }

    /// Resolves after the next add. A permit is stored if nobody is waiting.
    pub(crate) async fn notified(&self) {
        self.shared.notify.notified().await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueueEntry>> {
        // A panic while holding the lock cannot leave the deque half-modified
        self.shared.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
