//! Spacecraft-relative logical clock

use serde::{Deserialize, Serialize};

/// Identity stamp captured from a frame header: who sent it and when.
///
/// Time on the spacecraft is the pair (resets, uptime). Resets increments on every
/// reboot and uptime counts seconds since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpacecraftStamp {
    pub spacecraft_id: u32,
    pub resets: u16,
    pub uptime: u32,
}

impl SpacecraftStamp {
    pub fn new(spacecraft_id: u32, resets: u16, uptime: u32) -> Self {
        Self { spacecraft_id, resets, uptime }
    }
}
