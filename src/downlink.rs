//! Decode session: source, deframer, queue and store worker wired together

use futures::{Stream, StreamExt, future};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::DecoderConfig;
use crate::driver::{Driver, DriverReport};
use crate::frame::{FrameFormat, FrameSummary};
use crate::source::ByteSource;
use crate::sources::ReplaySource;
use crate::spacecraft::SpacecraftDirectory;
use crate::store::{PersistenceQueue, StorageBackend, StoreWorker, StoreWorkerHandle, WorkerReport, WorkerState};
use crate::{Result, TelemetryError};

/// Final counts of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub decode: DriverReport,
    pub store: WorkerReport,
}

/// A running decode session.
///
/// Startup opens the storage backend before any byte is read; a backend that cannot be
/// opened fails [`Downlink::start`] with [`TelemetryError::ConfigurationFatal`]. Dropping
/// the session cancels both tasks without waiting for them.
pub struct Downlink {
    frames: watch::Receiver<Option<Arc<FrameSummary>>>,
    queue: PersistenceQueue,
    cancel: CancellationToken,
    decoder: Option<JoinHandle<DriverReport>>,
    worker: Option<StoreWorkerHandle>,
}

impl Downlink {
    /// Start decoding frames of format `F` from `source` into `backend`.
    pub async fn start<F, S, B>(
        source: S,
        directory: Arc<dyn SpacecraftDirectory>,
        backend: B,
        config: DecoderConfig,
    ) -> Result<Self>
    where
        F: FrameFormat,
        S: ByteSource,
        B: StorageBackend,
    {
        config.validate()?;
        let queue = PersistenceQueue::new();
        let worker = StoreWorker::spawn(queue.clone(), backend, config.poll_interval()).await?;
        let channels = Driver::spawn::<F, S>(source, directory, queue.clone(), &config);

        info!(format = F::NAME, "Downlink session started");
        Ok(Self {
            frames: channels.frames,
            queue,
            cancel: channels.cancel,
            decoder: Some(channels.task),
            worker: Some(worker),
        })
    }

    /// Replay a recorded stream from disk.
    pub async fn replay<F, P, B>(
        path: P,
        directory: Arc<dyn SpacecraftDirectory>,
        backend: B,
        config: DecoderConfig,
    ) -> Result<Self>
    where
        F: FrameFormat,
        P: AsRef<Path>,
        B: StorageBackend,
    {
        let source = ReplaySource::open(path, &config.replay)?;
        Self::start::<F, _, _>(source, directory, backend, config).await
    }

    /// Summaries of assembled frames. Slow consumers see only the latest.
    pub fn frame_updates(&self) -> impl Stream<Item = Arc<FrameSummary>> + Unpin + 'static {
        WatchStream::new(self.frames.clone()).filter_map(future::ready)
    }

    /// The most recently assembled frame.
    pub fn latest_frame(&self) -> Option<Arc<FrameSummary>> {
        self.frames.borrow().clone()
    }

    /// Entries decoded but not yet taken by the store worker.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.as_ref().map_or(WorkerState::Stopped, StoreWorkerHandle::state)
    }

    /// Wait for the source to end, then stop the worker after its final drain.
    pub async fn join(mut self) -> Result<SessionReport> {
        let decode = self.wait_decoder().await?;
        let store = self.stop_worker().await?;
        info!(frames = decode.frames, committed = store.committed, "Downlink session finished");
        Ok(SessionReport { decode, store })
    }

    /// Stop reading now. Everything already decoded is still stored.
    pub async fn shutdown(mut self) -> Result<SessionReport> {
        debug!("Shutting down downlink session");
        self.cancel.cancel();
        let decode = self.wait_decoder().await?;
        let store = self.stop_worker().await?;
        info!(frames = decode.frames, committed = store.committed, "Downlink session shut down");
        Ok(SessionReport { decode, store })
    }

    async fn wait_decoder(&mut self) -> Result<DriverReport> {
        match self.decoder.take() {
            Some(task) => task
                .await
                .map_err(|e| TelemetryError::task_failed("decode", e.to_string())),
            None => Ok(DriverReport::default()),
        }
    }

    async fn stop_worker(&mut self) -> Result<WorkerReport> {
        match self.worker.take() {
            Some(worker) => worker.stop().await,
            None => Ok(WorkerReport::default()),
        }
    }
}

impl Drop for Downlink {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(worker) = &self.worker {
            debug!("Dropping downlink session with running worker");
            worker.cancel();
        }
    }
}
