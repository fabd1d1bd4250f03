//! Frame variant tables: which payload segments a frame type contains
//!
//! The two formats disagree on unknown type codes and the disagreement is kept on
//! purpose. SlowSpeed frames fall back to real-time values for type codes above the
//! radiation type, BPSK frames treat them as corrupt.

use tracing::warn;

use super::Header;
use crate::payload::PayloadKind;
use crate::spacecraft::SpacecraftKind;
use crate::{Result, TelemetryError};

/// SlowSpeed frame type codes.
pub mod slow_speed_types {
    pub const DEBUG: u8 = 0;
    pub const REAL_TIME: u8 = 1;
    pub const MAX_VALUES: u8 = 2;
    pub const MIN_VALUES: u8 = 3;
    pub const RAD_EXP_DATA: u8 = 4;
}

/// BPSK frame type codes.
pub mod bpsk_types {
    pub const ALL_WOD: u8 = 0;
    pub const REAL_TIME: u8 = 1;
    pub const MIN_MAX: u8 = 2;
    pub const REAL_TIME_BEACON: u8 = 3;
    pub const WOD_BEACON: u8 = 4;
    pub const BUS_PACKET_SCIENCE: u8 = 5;
    pub const BUS_PACKET_CAMERA: u8 = 6;
    /// Number of defined BPSK frame types
    pub const TYPES_OF_FRAME: u8 = 7;
}

/// Ordered segment kinds for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameVariant {
    pub slots: Vec<PayloadKind>,
    /// Single experiment segment that takes every payload byte
    pub bus_packet: bool,
    /// The type code was unknown and the format's fallback was applied
    pub fallback: bool,
}

impl FrameVariant {
    fn fixed(slots: Vec<PayloadKind>) -> Self {
        Self { slots, bus_packet: false, fallback: false }
    }

    fn bus_packet() -> Self {
        Self { slots: vec![PayloadKind::Experiment], bus_packet: true, fallback: false }
    }
}

/// SlowSpeed table. Never fails.
pub fn slow_speed_variant(header: &Header) -> FrameVariant {
    use slow_speed_types::*;

    let kind = match header.frame_type {
        DEBUG | REAL_TIME => PayloadKind::RealTime,
        MAX_VALUES => PayloadKind::MaxValues,
        MIN_VALUES => PayloadKind::MinValues,
        RAD_EXP_DATA => PayloadKind::RadExp,
        other => {
            warn!(
                spacecraft = header.spacecraft_id,
                frame_type = other,
                "Invalid payload type, defaulting to real-time values"
            );
            return FrameVariant { fallback: true, ..FrameVariant::fixed(vec![PayloadKind::RealTime]) };
        }
    };
    FrameVariant::fixed(vec![kind])
}

/// BPSK table. Unknown type codes are an error.
pub fn bpsk_variant(kind: SpacecraftKind, header: &Header) -> Result<FrameVariant> {
    use PayloadKind::*;
    use bpsk_types::*;

    let (wod_rad, rad) = match kind {
        SpacecraftKind::Standard => (WodRad, RadExp),
        SpacecraftKind::UwExperiment => (WodExperiment, Experiment),
    };

    let variant = match header.frame_type {
        ALL_WOD => FrameVariant::fixed(vec![wod_rad, Wod, wod_rad, Wod, wod_rad, Wod]),
        REAL_TIME => FrameVariant::fixed(vec![wod_rad, Wod, wod_rad, Wod, RealTime, rad]),
        MIN_MAX => FrameVariant::fixed(vec![wod_rad, Wod, wod_rad, Wod, MaxValues, MinValues]),
        REAL_TIME_BEACON => FrameVariant::fixed(vec![RealTime, Wod, Wod, Wod, Wod, Wod]),
        WOD_BEACON => FrameVariant::fixed(vec![Wod; 6]),
        BUS_PACKET_SCIENCE | BUS_PACKET_CAMERA => FrameVariant::bus_packet(),
        frame_type => {
            return Err(TelemetryError::UnknownFrameType {
                spacecraft_id: header.spacecraft_id,
                frame_type,
            });
        }
    };
    Ok(variant)
}
