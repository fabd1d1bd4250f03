//! Persistence: the decode-to-storage hand-off.
//!
//! Decoding never waits for storage. Complete frames push their segments onto a
//! [`PersistenceQueue`]; a single [`StoreWorker`] task drains the queue in FIFO order
//! and commits each segment to a [`StorageBackend`].

use crate::Result;
use crate::payload::{ScanLine, StoreRecord};

mod memory;
mod queue;
mod worker;

pub use memory::MemoryStore;
pub use queue::{PersistenceQueue, QueueEntry};
pub use worker::{StoreWorker, StoreWorkerHandle, WorkerReport, WorkerState};

/// Storage engine the worker commits to.
///
/// The backend is constructed by the caller, opened once when the worker starts and
/// closed once when it stops. Record identity is the record's
/// [`RecordKey`](crate::payload::RecordKey); storing the same key twice is the backend's
/// concern.
#[async_trait::async_trait]
pub trait StorageBackend: Send + 'static {
    /// Prepare the backend. Failure aborts worker startup.
    async fn open(&mut self) -> Result<()>;

    async fn store(&mut self, record: &StoreRecord) -> Result<()>;

    async fn store_scan_line(&mut self, line: &ScanLine) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}
