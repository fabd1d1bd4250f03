//! Background task committing queued segments to storage

use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{PersistenceQueue, QueueEntry, StorageBackend};
use crate::payload::StoreItem;
use crate::{Result, TelemetryError};

/// Lifecycle of the store worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkerState {
    Stopped,
    Running,
    /// Final drain in progress
    Stopping,
}

/// Counts of store calls made by the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    /// Queue entries taken
    pub entries: u64,
    /// Store calls that succeeded
    pub committed: u64,
    /// Store calls that failed, plus entries whose fields could not be decoded
    pub dropped: u64,
}

/// Handle to a running store worker.
#[derive(Debug)]
pub struct StoreWorkerHandle {
    cancel: CancellationToken,
    state: watch::Receiver<WorkerState>,
    progress: watch::Receiver<WorkerReport>,
    task: JoinHandle<WorkerReport>,
}

impl StoreWorkerHandle {
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    /// Counts as of the last completed drain.
    pub fn progress(&self) -> WorkerReport {
        *self.progress.borrow()
    }

    /// Watch counts, updated after every drain.
    pub fn subscribe_progress(&self) -> watch::Receiver<WorkerReport> {
        self.progress.clone()
    }

    /// Request a stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the worker and wait for the final drain and backend close.
    pub async fn stop(self) -> Result<WorkerReport> {
        self.cancel.cancel();
        self.task.await.map_err(|e| TelemetryError::task_failed("store worker", e.to_string()))
    }
}

/// Single consumer of the persistence queue.
///
/// Wakes on a poll tick or when entries are added, drains everything queued in FIFO
/// order and commits it sequentially. A failed store call is logged and its item
/// dropped; it is never retried and never stops the loop.
pub struct StoreWorker;

impl StoreWorker {
    /// Open the backend and start the worker.
    ///
    /// Returns [`TelemetryError::ConfigurationFatal`] if the backend cannot be opened.
    pub async fn spawn<B>(
        queue: PersistenceQueue,
        mut backend: B,
        poll_interval: Duration,
    ) -> Result<StoreWorkerHandle>
    where
        B: StorageBackend,
    {
        if let Err(e) = backend.open().await {
            error!("Storage backend failed to open: {}", e);
            return Err(match e {
                fatal @ TelemetryError::ConfigurationFatal { .. } => fatal,
                other => TelemetryError::ConfigurationFatal {
                    reason: "storage backend failed to open".to_string(),
                    source: Some(Box::new(other)),
                },
            });
        }

        let (state_tx, state_rx) = watch::channel(WorkerState::Running);
        let (progress_tx, progress_rx) = watch::channel(WorkerReport::default());
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();
        let poll_interval = poll_interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            Self::worker_task(queue, backend, poll_interval, state_tx, progress_tx, cancel_task).await
        });

        Ok(StoreWorkerHandle { cancel, state: state_rx, progress: progress_rx, task })
    }

    async fn worker_task<B>(
        queue: PersistenceQueue,
        mut backend: B,
        poll_interval: Duration,
        state_tx: watch::Sender<WorkerState>,
        progress_tx: watch::Sender<WorkerReport>,
        cancel: CancellationToken,
    ) -> WorkerReport
    where
        B: StorageBackend,
    {
        info!(poll_ms = poll_interval.as_millis() as u64, "Store worker started");
        let mut report = WorkerReport::default();
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = queue.notified() => trace!("Woken by queue"),
                _ = ticker.tick() => {}
            }

            if Self::drain(&queue, &mut backend, &mut report).await > 0 {
                progress_tx.send_replace(report);
            }
        }

        state_tx.send_replace(WorkerState::Stopping);
        let last = Self::drain(&queue, &mut backend, &mut report).await;
        debug!(entries = last, "Final drain complete");
        progress_tx.send_replace(report);

        if let Err(e) = backend.close().await {
            warn!("Storage backend failed to close cleanly: {}", e);
        }
        state_tx.send_replace(WorkerState::Stopped);

        info!(
            entries = report.entries,
            committed = report.committed,
            dropped = report.dropped,
            "Store worker stopped"
        );
        report
    }

    /// Commit everything queued. Returns the number of entries taken.
    async fn drain<B>(queue: &PersistenceQueue, backend: &mut B, report: &mut WorkerReport) -> usize
    where
        B: StorageBackend,
    {
        let entries = queue.drain();
        let count = entries.len();
        for entry in entries {
            Self::commit(entry, backend, report).await;
        }
        count
    }

    async fn commit<B>(entry: QueueEntry, backend: &mut B, report: &mut WorkerReport)
    where
        B: StorageBackend,
    {
        report.entries += 1;
        let kind = entry.segment.kind();
        let items = match entry.segment.store_items(entry.stamp) {
            Ok(items) => items,
            Err(e) => {
                report.dropped += 1;
                warn!(
                    spacecraft = entry.stamp.spacecraft_id,
                    resets = entry.stamp.resets,
                    uptime = entry.stamp.uptime,
                    kind = %kind,
                    "Segment dropped: {}",
                    e
                );
                return;
            }
        };

        for item in items {
            let result = match &item {
                StoreItem::Record(record) => backend.store(record).await,
                StoreItem::ScanLine(line) => backend.store_scan_line(line).await,
            };
            match result {
                Ok(()) => report.committed += 1,
                Err(e) => {
                    report.dropped += 1;
                    warn!(
                        spacecraft = entry.stamp.spacecraft_id,
                        resets = entry.stamp.resets,
                        uptime = entry.stamp.uptime,
                        kind = %kind,
                        "Store failed, item dropped: {}",
                        e
                    );
                }
            }
        }
    }
}
