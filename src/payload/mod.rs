//! Payload segments.
//!
//! A segment is one fixed-size slice of a frame's payload area. Its kind decides how the
//! raw bytes become stored records:
//!
//! - record kinds (real-time, min, max, radiation, WOD, WOD radiation) decode once with
//!   a layout and produce one record
//! - [`PayloadKind::Experiment`] fans out into one record per embedded bus packet
//! - [`PayloadKind::WodExperiment`] produces a WOD summary record *and* its bus packets
//! - [`PayloadKind::Camera`] produces scan lines, stored one at a time
//!
//! Fields are decoded lazily on first access and cached; decoding the same raw bytes
//! twice yields identical values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

use crate::Result;
use crate::spacecraft::LayoutKind;
use crate::types::{BitArrayLayout, FieldSet, SpacecraftStamp};

mod bus;
mod camera;
mod record;

pub use bus::{BUS_PACKET_HEADER_SIZE, BusPacket, MAX_BUS_PACKET_DATA, extract_bus_packets};
pub use camera::{MAX_SCAN_LINES, SCAN_LINE_HEADER_SIZE, ScanLine, extract_scan_lines};
pub use record::{RecordBody, RecordKey, StoreItem, StoreRecord};

/// Telemetry record kinds a segment can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    RealTime,
    MaxValues,
    MinValues,
    RadExp,
    Wod,
    WodRad,
    Experiment,
    WodExperiment,
    Camera,
}

impl PayloadKind {
    /// Layout used to decode this kind. Camera segments have none.
    pub const fn layout_kind(&self) -> Option<LayoutKind> {
        match self {
            PayloadKind::RealTime => Some(LayoutKind::RealTime),
            PayloadKind::MaxValues => Some(LayoutKind::MaxValues),
            PayloadKind::MinValues => Some(LayoutKind::MinValues),
            PayloadKind::RadExp | PayloadKind::Experiment => Some(LayoutKind::RadExp),
            PayloadKind::Wod => Some(LayoutKind::Wod),
            PayloadKind::WodRad | PayloadKind::WodExperiment => Some(LayoutKind::WodRad),
            PayloadKind::Camera => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            PayloadKind::RealTime => "real-time",
            PayloadKind::MaxValues => "max-values",
            PayloadKind::MinValues => "min-values",
            PayloadKind::RadExp => "radiation",
            PayloadKind::Wod => "wod",
            PayloadKind::WodRad => "wod-radiation",
            PayloadKind::Experiment => "experiment",
            PayloadKind::WodExperiment => "wod-experiment",
            PayloadKind::Camera => "camera",
        }
    }

    /// Returns true for kinds that carry bus packets.
    pub const fn carries_bus_packets(&self) -> bool {
        matches!(self, PayloadKind::Experiment | PayloadKind::WodExperiment)
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State shared by every segment kind.
#[derive(Debug)]
struct SegmentCore {
    kind: PayloadKind,
    stamp: SpacecraftStamp,
    slot: u8,
    raw: Box<[u8]>,
    cursor: usize,
    layout: Arc<BitArrayLayout>,
    fields: OnceLock<FieldSet>,
}

impl SegmentCore {
    fn new(
        kind: PayloadKind,
        stamp: SpacecraftStamp,
        slot: u8,
        capacity: usize,
        layout: Arc<BitArrayLayout>,
    ) -> Self {
        Self {
            kind,
            stamp,
            slot,
            raw: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            layout,
            fields: OnceLock::new(),
        }
    }

    fn add_byte(&mut self, byte: u8) -> bool {
        match self.raw.get_mut(self.cursor) {
            Some(slot) => {
                *slot = byte;
                self.cursor += 1;
                true
            }
            None => {
                trace!(kind = %self.kind, capacity = self.raw.len(), "Segment full, byte ignored");
                false
            }
        }
    }

    fn fields(&self) -> Result<&FieldSet> {
        if let Some(fields) = self.fields.get() {
            return Ok(fields);
        }
        let decoded = self.layout.decode(&self.raw)?;
        Ok(self.fields.get_or_init(|| decoded))
    }

    fn key(&self, serial: u16) -> RecordKey {
        RecordKey { stamp: self.stamp, kind: self.kind, slot: self.slot, serial }
    }
}

/// Segment decoded once into a single record.
#[derive(Debug)]
pub struct RecordSegment {
    core: SegmentCore,
}

/// Segment whose bytes after the layout fields hold bus packets.
#[derive(Debug)]
pub struct ExperimentSegment {
    core: SegmentCore,
    packets: OnceLock<Vec<BusPacket>>,
}

impl ExperimentSegment {
    /// Bus packets following the layout fields.
    pub fn bus_packets(&self) -> &[BusPacket] {
        self.packets.get_or_init(|| {
            let start = self.core.layout.byte_len().min(self.core.raw.len());
            extract_bus_packets(&self.core.raw[start..])
        })
    }
}

/// Segment that decomposes into picture scan lines.
#[derive(Debug)]
pub struct CameraSegment {
    core: SegmentCore,
    lines: OnceLock<Vec<ScanLine>>,
}

impl CameraSegment {
    /// Scan lines in wire order, not yet stamped.
    pub fn scan_lines(&self) -> &[ScanLine] {
        self.lines.get_or_init(|| extract_scan_lines(&self.core.raw))
    }
}

/// One payload segment of a frame.
#[derive(Debug)]
pub enum PayloadSegment {
    Record(RecordSegment),
    Experiment(ExperimentSegment),
    Camera(CameraSegment),
}

impl PayloadSegment {
    /// Create an empty segment of the given kind and raw capacity.
    pub fn new(
        kind: PayloadKind,
        stamp: SpacecraftStamp,
        slot: u8,
        capacity: usize,
        layout: Arc<BitArrayLayout>,
    ) -> Self {
        let core = SegmentCore::new(kind, stamp, slot, capacity, layout);
        match kind {
            PayloadKind::Experiment | PayloadKind::WodExperiment => {
                PayloadSegment::Experiment(ExperimentSegment { core, packets: OnceLock::new() })
            }
            PayloadKind::Camera => PayloadSegment::Camera(CameraSegment { core, lines: OnceLock::new() }),
            _ => PayloadSegment::Record(RecordSegment { core }),
        }
    }

    fn core(&self) -> &SegmentCore {
        match self {
            PayloadSegment::Record(segment) => &segment.core,
            PayloadSegment::Experiment(segment) => &segment.core,
            PayloadSegment::Camera(segment) => &segment.core,
        }
    }

    fn core_mut(&mut self) -> &mut SegmentCore {
        match self {
            PayloadSegment::Record(segment) => &mut segment.core,
            PayloadSegment::Experiment(segment) => &mut segment.core,
            PayloadSegment::Camera(segment) => &mut segment.core,
        }
    }

    pub fn kind(&self) -> PayloadKind {
        self.core().kind
    }

    /// Header identity captured when the segment was created.
    pub fn stamp(&self) -> SpacecraftStamp {
        self.core().stamp
    }

    pub fn slot(&self) -> u8 {
        self.core().slot
    }

    pub fn capacity(&self) -> usize {
        self.core().raw.len()
    }

    /// Number of bytes supplied so far.
    pub fn len(&self) -> usize {
        self.core().cursor
    }

    pub fn is_empty(&self) -> bool {
        self.core().cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.core().cursor == self.core().raw.len()
    }

    pub fn raw(&self) -> &[u8] {
        &self.core().raw
    }

    pub fn layout(&self) -> &BitArrayLayout {
        &self.core().layout
    }

    /// Append the next raw byte. Returns false if the segment is already full.
    pub fn add_byte(&mut self, byte: u8) -> bool {
        self.core_mut().add_byte(byte)
    }

    /// Decoded layout fields, materialized on first call.
    pub fn fields(&self) -> Result<&FieldSet> {
        self.core().fields()
    }

    /// Force decoding of everything this segment will store.
    pub fn materialize(&self) -> Result<()> {
        self.fields()?;
        match self {
            PayloadSegment::Record(_) => {}
            PayloadSegment::Experiment(segment) => {
                segment.bus_packets();
            }
            PayloadSegment::Camera(segment) => {
                segment.scan_lines();
            }
        }
        Ok(())
    }

    /// Bus packets for experiment kinds, empty otherwise.
    pub fn bus_packets(&self) -> &[BusPacket] {
        match self {
            PayloadSegment::Experiment(segment) => segment.bus_packets(),
            _ => &[],
        }
    }

    /// Scan lines for camera segments, empty otherwise.
    pub fn scan_lines(&self) -> &[ScanLine] {
        match self {
            PayloadSegment::Camera(segment) => segment.scan_lines(),
            _ => &[],
        }
    }

    /// Store operations for this segment, stamped with the given identity.
    ///
    /// The stamp is normally the one captured from the header; the queue passes its
    /// entry stamp so the two always agree.
    pub fn store_items(&self, stamp: SpacecraftStamp) -> Result<Vec<StoreItem>> {
        let core = self.core();
        let key = |serial| RecordKey { stamp, ..core.key(serial) };

        let items = match self {
            PayloadSegment::Record(_) => {
                vec![StoreItem::Record(StoreRecord {
                    key: key(0),
                    body: RecordBody::Fields(self.fields()?.clone()),
                })]
            }
            PayloadSegment::Experiment(segment) => {
                let mut items = Vec::new();
                let mut serial = 0u16;
                if core.kind == PayloadKind::WodExperiment {
                    items.push(StoreItem::Record(StoreRecord {
                        key: key(serial),
                        body: RecordBody::Fields(self.fields()?.clone()),
                    }));
                    serial += 1;
                } else {
                    self.fields()?;
                }
                for packet in segment.bus_packets() {
                    items.push(StoreItem::Record(StoreRecord {
                        key: key(serial),
                        body: RecordBody::BusPacket(packet.clone()),
                    }));
                    serial = serial.saturating_add(1);
                }
                items
            }
            PayloadSegment::Camera(segment) => segment
                .scan_lines()
                .iter()
                .map(|line| StoreItem::ScanLine(line.clone().stamped(stamp)))
                .collect(),
        };

        Ok(items)
    }
}
