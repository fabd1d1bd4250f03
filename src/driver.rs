//! Driver spawns and manages the decode task

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::DecoderConfig;
use crate::frame::{FrameFormat, FrameSummary};
use crate::source::ByteSource;
use crate::spacecraft::SpacecraftDirectory;
use crate::store::PersistenceQueue;
use crate::stream::Deframer;

/// Counters kept by the decode task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverReport {
    pub frames: u64,
    pub decodable: u64,
    pub corrupt: u64,
    pub segments_queued: u64,
    pub source_errors: u64,
    /// Bytes of an unfinished frame when the stream ended
    pub trailing_bytes: usize,
}

/// Result of spawning the decode task
pub struct DriverChannels {
    /// Receiver for summaries of assembled frames
    pub frames: watch::Receiver<Option<Arc<FrameSummary>>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Resolves when the source ends, fails for good or is cancelled
    pub task: JoinHandle<DriverReport>,
}

/// Driver spawns the decode task
///
/// The task owns the source and a deframer. Decoding itself never awaits; every
/// complete frame is summarized for observers and, if decodable, its segments are
/// queued for storage.
pub struct Driver;

impl Driver {
    /// Spawn the decode task for frames of format `F`
    pub fn spawn<F, S>(
        source: S,
        directory: Arc<dyn SpacecraftDirectory>,
        queue: PersistenceQueue,
        config: &DecoderConfig,
    ) -> DriverChannels
    where
        F: FrameFormat,
        S: ByteSource,
    {
        let (frame_tx, frame_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();
        let max_errors = config.max_source_errors.max(1);

        let task = tokio::spawn(async move {
            let deframer = Deframer::<F>::new(directory);
            Self::decode_task(source, deframer, queue, frame_tx, cancel_task, max_errors).await
        });

        DriverChannels { frames: frame_rx, cancel, task }
    }

    async fn decode_task<F, S>(
        mut source: S,
        mut deframer: Deframer<F>,
        queue: PersistenceQueue,
        frame_tx: watch::Sender<Option<Arc<FrameSummary>>>,
        cancel: CancellationToken,
        max_errors: u32,
    ) -> DriverReport
    where
        F: FrameFormat,
        S: ByteSource,
    {
        info!(format = F::NAME, "Decode task started");
        let mut report = DriverReport::default();
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Decode task cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Decode task cancelled during read");
                    break;
                }
                result = source.next_chunk() => result,
            };

            match result {
                Ok(Some(chunk)) => {
                    error_count = 0;
                    for frame in deframer.push(&chunk) {
                        report.frames += 1;
                        let summary = Arc::new(frame.summary());

                        if frame.is_decodable() {
                            report.decodable += 1;
                            trace!("Frame {}: {:?}", report.frames, summary.segment_kinds);
                            report.segments_queued += frame.enqueue(&queue) as u64;
                        } else {
                            report.corrupt += 1;
                            debug!("Frame {} corrupt: {}", report.frames, summary.fault.as_deref().unwrap_or("unknown"));
                        }

                        // Observers are optional
                        frame_tx.send_replace(Some(summary));
                    }
                }
                Ok(None) => {
                    report.trailing_bytes = deframer.pending_bytes();
                    if report.trailing_bytes > 0 {
                        warn!("Stream ended inside a frame, {} bytes discarded", report.trailing_bytes);
                    }
                    info!("Source ended after {} frames", report.frames);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    report.source_errors += 1;
                    error!("Source error ({}/{}): {}", error_count, max_errors, e);

                    if error_count >= max_errors {
                        error!("Too many source errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        info!(
            frames = report.frames,
            decodable = report.decodable,
            corrupt = report.corrupt,
            "Decode task ended"
        );
        report
    }
}
