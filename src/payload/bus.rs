//! Bus packets carried inside experiment segments
//!
//! Each packet starts with a 2-byte big-endian header: the upper 12 bits are the
//! packet id and the lower 4 bits the data length (0 to 8). A zero header marks the
//! end of the packet list, the rest of the segment is padding.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Largest data length a bus packet may declare.
pub const MAX_BUS_PACKET_DATA: usize = 8;

/// Size of the packet header on the wire.
pub const BUS_PACKET_HEADER_SIZE: usize = 2;

/// One self-delimited packet extracted from an experiment segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusPacket {
    /// 12-bit packet id
    pub id: u16,
    pub data: Vec<u8>,
}

impl BusPacket {
    /// Id 0 with no data is not a packet on the wire: it encodes to the end marker.
    pub fn new(id: u16, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// Wire encoding, header followed by data. Data past 8 bytes is dropped, and id 0
    /// with no data yields the end marker that stops extraction.
    pub fn encode(&self) -> Vec<u8> {
        let length = self.data.len().min(MAX_BUS_PACKET_DATA);
        let header = ((self.id & 0x0FFF) << 4) | length as u16;
        let mut bytes = header.to_be_bytes().to_vec();
        bytes.extend_from_slice(&self.data[..length]);
        bytes
    }
}

/// Extract packets from the bytes of an experiment segment.
///
/// Stops at the end marker, at the end of the data, or at the first malformed packet.
pub fn extract_bus_packets(data: &[u8]) -> Vec<BusPacket> {
    let mut packets = Vec::new();
    let mut position = 0;

    while position + BUS_PACKET_HEADER_SIZE <= data.len() {
        let header = u16::from_be_bytes([data[position], data[position + 1]]);
        if header == 0 {
            break;
        }

        let id = header >> 4;
        let length = (header & 0x0F) as usize;
        if length > MAX_BUS_PACKET_DATA {
            warn!(position, length, "Bus packet length out of range, dropping rest of segment");
            break;
        }

        let start = position + BUS_PACKET_HEADER_SIZE;
        let Some(payload) = data.get(start..start + length) else {
            warn!(position, length, "Bus packet runs past end of segment");
            break;
        };

        packets.push(BusPacket::new(id, payload.to_vec()));
        position = start + length;
    }

    packets
}
