//! Frame headers
//!
//! Both formats pack the same four logical fields MSB-first from bit 0:
//!
//! ```text
//! SlowSpeed (6 bytes):  id:3 | resets:16 | uptime:25 | type:4
//! BPSK      (8 bytes):  id:3 | resets:16 | uptime:25 | type:4 |
//!                       safe:1 | health:1 | science:1 | camera:1 | reserved:12
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{BitReader, BitWriter, SpacecraftStamp};

const ID_BITS: u32 = 3;
const RESETS_BITS: u32 = 16;
const UPTIME_BITS: u32 = 25;
const TYPE_BITS: u32 = 4;
const BPSK_RESERVED_BITS: u32 = 12;

/// Largest uptime a header can carry.
pub const MAX_UPTIME: u32 = (1 << UPTIME_BITS) - 1;

/// Largest spacecraft id a header can carry.
pub const MAX_SPACECRAFT_ID: u32 = (1 << ID_BITS) - 1;

/// Spacecraft operating modes reported in BPSK headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeFlags {
    pub safe: bool,
    pub health: bool,
    pub science: bool,
    pub camera: bool,
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub spacecraft_id: u32,
    pub frame_type: u8,
    pub uptime: u32,
    pub resets: u16,
    /// Present on BPSK headers only
    pub modes: Option<ModeFlags>,
}

impl Header {
    pub fn new(spacecraft_id: u32, frame_type: u8, resets: u16, uptime: u32) -> Self {
        Self { spacecraft_id, frame_type, uptime, resets, modes: None }
    }

    pub fn with_modes(mut self, modes: ModeFlags) -> Self {
        self.modes = Some(modes);
        self
    }

    pub fn stamp(&self) -> SpacecraftStamp {
        SpacecraftStamp::new(self.spacecraft_id, self.resets, self.uptime)
    }

    pub(crate) fn decode_slow_speed(raw: &[u8]) -> Self {
        let mut reader = BitReader::new(raw);
        Self::decode_common(&mut reader)
    }

    pub(crate) fn decode_bpsk(raw: &[u8]) -> Self {
        let mut reader = BitReader::new(raw);
        let header = Self::decode_common(&mut reader);
        let modes = ModeFlags {
            safe: reader.read_flag().unwrap_or(false),
            health: reader.read_flag().unwrap_or(false),
            science: reader.read_flag().unwrap_or(false),
            camera: reader.read_flag().unwrap_or(false),
        };
        header.with_modes(modes)
    }

    fn decode_common(reader: &mut BitReader<'_>) -> Self {
        let spacecraft_id = reader.read(ID_BITS).unwrap_or(0);
        let resets = reader.read(RESETS_BITS).unwrap_or(0) as u16;
        let uptime = reader.read(UPTIME_BITS).unwrap_or(0);
        let frame_type = reader.read(TYPE_BITS).unwrap_or(0) as u8;
        Self::new(spacecraft_id, frame_type, resets, uptime)
    }

    pub(crate) fn encode_slow_speed(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.encode_common(&mut writer);
        writer.into_bytes()
    }

    pub(crate) fn encode_bpsk(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.encode_common(&mut writer);
        let modes = self.modes.unwrap_or_default();
        writer.write_flag(modes.safe);
        writer.write_flag(modes.health);
        writer.write_flag(modes.science);
        writer.write_flag(modes.camera);
        writer.write(0, BPSK_RESERVED_BITS);
        writer.into_bytes()
    }

    fn encode_common(&self, writer: &mut BitWriter) {
        writer.write(self.spacecraft_id, ID_BITS);
        writer.write(self.resets as u32, RESETS_BITS);
        writer.write(self.uptime, UPTIME_BITS);
        writer.write(self.frame_type as u32, TYPE_BITS);
    }
}
