//! Frame assembly, dispatch and persistence for amateur-radio satellite telemetry.
//!
//! foxtlm turns the raw byte stream from a satellite downlink into stored telemetry
//! records. Bytes are fed one at a time into a [`Frame`], which decodes the header as
//! soon as it is complete, looks the spacecraft up in a [`SpacecraftDirectory`] and
//! routes the payload into typed segments. Complete frames hand their segments to a
//! [`PersistenceQueue`]; a background [`StoreWorker`] commits them to a
//! [`StorageBackend`] without ever blocking the decoder.
//!
//! # Features
//!
//! - **Two frame formats**: 96-byte slow-speed frames and 572-byte six-segment BPSK frames
//! - **Incremental decoding**: constant work per byte, corruption detected at the header
//! - **Bus packets and camera lines**: experiment segments fan out into individual records
//! - **Ordered persistence**: FIFO hand-off to any async storage backend
//!
//! ## Example (recorded pass)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use foxtlm::{DecoderConfig, Downlink, MemoryStore, SpacecraftRegistry};
//! use foxtlm::frame::Bpsk;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> foxtlm::Result<()> {
//!     let registry = Arc::new(SpacecraftRegistry::from_path("spacecraft.yaml")?);
//!     let store = MemoryStore::new();
//!
//!     let downlink =
//!         Downlink::replay::<Bpsk, _, _>("pass.bin", registry, store.clone(), DecoderConfig::default())
//!             .await?;
//!
//!     let mut frames = downlink.frame_updates();
//!     if let Some(summary) = frames.next().await {
//!         println!("{:?} {:?}", summary.header, summary.segment_kinds);
//!     }
//!
//!     let report = downlink.join().await?;
//!     println!("{} records stored", report.store.committed);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding
pub mod frame;
pub mod payload;
pub mod spacecraft;
pub mod stream;

// Sources, persistence and the decode session
pub mod config;
pub mod downlink;
pub mod driver;
pub mod source;
pub mod sources;
pub mod store;

// Core exports
pub use error::*;
pub use types::*;

pub use config::{DecoderConfig, ReplayConfig};
pub use downlink::{Downlink, SessionReport};
pub use frame::{BpskFrame, Frame, FrameEncoder, FrameState, FrameSummary, Header, SlowSpeedFrame};
pub use payload::{PayloadKind, PayloadSegment};
pub use source::ByteSource;
pub use spacecraft::{Spacecraft, SpacecraftDirectory, SpacecraftKind, SpacecraftRegistry};
pub use store::{MemoryStore, PersistenceQueue, StorageBackend, StoreWorker, WorkerReport};
pub use stream::Deframer;
