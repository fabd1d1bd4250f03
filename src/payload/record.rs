//! Records handed to the storage backend

use serde::{Deserialize, Serialize};

use super::{BusPacket, PayloadKind, ScanLine};
use crate::types::{FieldSet, SpacecraftStamp};

/// Natural primary key of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub stamp: SpacecraftStamp,
    pub kind: PayloadKind,
    /// Segment position within its frame
    pub slot: u8,
    /// Sub-record index within the segment, 0 for single-record segments
    pub serial: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordBody {
    Fields(FieldSet),
    BusPacket(BusPacket),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub key: RecordKey,
    pub body: RecordBody,
}

/// One store operation produced by a segment.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreItem {
    Record(StoreRecord),
    ScanLine(ScanLine),
}
