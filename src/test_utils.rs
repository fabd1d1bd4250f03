//! Synthetic spacecraft and frames shared by unit tests and benchmarks

#![cfg(any(test, feature = "benchmark"))]

use std::sync::Arc;

use crate::frame::{Bpsk, FrameEncoder, FrameFormat, Header, SlowSpeed, bpsk_types};
use crate::spacecraft::{LayoutKind, Spacecraft, SpacecraftKind, SpacecraftRegistry};
use crate::types::{BitArrayLayout, Conversion, LayoutField};

/// Spacecraft with every record layout.
pub const STANDARD_ID: u32 = 1;

/// Experiment spacecraft that forwards bus packets to a local server. Its radiation
/// layout is empty so bus packets start at byte 0.
pub const EXPERIMENT_ID: u32 = 6;

/// Id that no spacecraft uses.
pub const UNCONFIGURED_ID: u32 = 4;

fn layout(kind: LayoutKind, fields: Vec<LayoutField>) -> BitArrayLayout {
    match BitArrayLayout::new(kind.name(), fields) {
        Ok(layout) => layout,
        Err(e) => panic!("invalid test layout {kind}: {e}"),
    }
}

fn record_layouts(mut spacecraft: Spacecraft) -> Spacecraft {
    let realtime = vec![
        LayoutField::new("BATT_A_V", 12)
            .with_units("V")
            .with_conversion(Conversion::Linear { scale: 0.01, offset: 0.0 }),
        LayoutField::new("BATT_B_V", 12),
        LayoutField::new("PANEL_TEMP", 12).with_conversion(Conversion::Signed),
        LayoutField::new("RSSI", 12),
    ];
    for kind in [LayoutKind::RealTime, LayoutKind::MaxValues, LayoutKind::MinValues] {
        spacecraft = spacecraft.with_layout(kind, layout(kind, realtime.clone()));
    }
    spacecraft
        .with_layout(LayoutKind::Wod, layout(LayoutKind::Wod, vec![
            LayoutField::new("WOD_RESETS", 16),
            LayoutField::new("WOD_UPTIME", 25),
            LayoutField::new("BATT_V", 12),
        ]))
        .with_layout(LayoutKind::WodRad, layout(LayoutKind::WodRad, vec![
            LayoutField::new("WOD_RESETS", 16),
            LayoutField::new("WOD_UPTIME", 25),
        ]))
}

/// Registry with a standard and an experiment spacecraft.
pub fn test_registry() -> SpacecraftRegistry {
    let standard = record_layouts(Spacecraft::new(STANDARD_ID, "Fox-1A", SpacecraftKind::Standard))
        .with_layout(LayoutKind::RadExp, layout(LayoutKind::RadExp, vec![
            LayoutField::new("STATE", 8),
            LayoutField::new("COUNT", 16),
        ]));
    let experiment = record_layouts(Spacecraft::new(EXPERIMENT_ID, "HuskySat", SpacecraftKind::UwExperiment))
        .with_local_server(true)
        .with_layout(LayoutKind::RadExp, layout(LayoutKind::RadExp, Vec::new()));

    let mut registry = SpacecraftRegistry::new();
    for spacecraft in [standard, experiment] {
        if let Err(e) = registry.insert(spacecraft) {
            panic!("test registry: {e}");
        }
    }
    registry
}

pub fn test_directory() -> Arc<SpacecraftRegistry> {
    Arc::new(test_registry())
}

/// Encoded SlowSpeed real-time frame with all-zero payload.
pub fn slow_speed_frame(uptime: u32) -> Vec<u8> {
    FrameEncoder::<SlowSpeed>::new(Header::new(STANDARD_ID, 1, 1, uptime)).build()
}

/// Encoded BPSK frame of the given type with patterned segments.
pub fn bpsk_frame(frame_type: u8, uptime: u32) -> Vec<u8> {
    let mut encoder = FrameEncoder::<Bpsk>::new(Header::new(STANDARD_ID, frame_type, 2, uptime));
    for slot in 0..Bpsk::SEGMENT_COUNT {
        encoder = encoder.segment(vec![slot as u8 * 17; Bpsk::SEGMENT_SIZE]);
    }
    encoder.build()
}

/// A stream of `count` back-to-back BPSK real-time frames.
pub fn bpsk_stream(count: usize) -> Vec<u8> {
    (0..count).flat_map(|i| bpsk_frame(bpsk_types::REAL_TIME, 100 + i as u32)).collect()
}
