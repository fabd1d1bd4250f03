//! Frame formats
//!
//! | Format    | Header | Segments | Payload | Trailer | Total |
//! |-----------|--------|----------|---------|---------|-------|
//! | SlowSpeed | 6      | 1 × 58   | 58      | 32      | 96    |
//! | BPSK      | 8      | 6 × 78   | 468     | 96      | 572   |

use super::Header;
use super::variant::{FrameVariant, bpsk_variant, slow_speed_variant};
use crate::Result;
use crate::spacecraft::SpacecraftKind;

/// Sizes, header layout and variant table of one physical frame format.
pub trait FrameFormat: Send + Sync + 'static {
    const NAME: &'static str;
    const HEADER_SIZE: usize;
    const SEGMENT_SIZE: usize;
    const SEGMENT_COUNT: usize;
    /// Forward error correction bytes, consumed but not decoded
    const TRAILER_SIZE: usize;

    const PAYLOAD_SIZE: usize = Self::SEGMENT_SIZE * Self::SEGMENT_COUNT;
    const TOTAL_SIZE: usize = Self::HEADER_SIZE + Self::PAYLOAD_SIZE + Self::TRAILER_SIZE;

    fn decode_header(raw: &[u8]) -> Header;

    fn encode_header(header: &Header) -> Vec<u8>;

    /// Resolve the segment sequence for a frame from this spacecraft kind.
    fn variant(kind: SpacecraftKind, header: &Header) -> Result<FrameVariant>;
}

/// Legacy single-payload frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlowSpeed;

impl FrameFormat for SlowSpeed {
    const NAME: &'static str = "slow-speed";
    const HEADER_SIZE: usize = 6;
    const SEGMENT_SIZE: usize = 58;
    const SEGMENT_COUNT: usize = 1;
    const TRAILER_SIZE: usize = 32;

    fn decode_header(raw: &[u8]) -> Header {
        Header::decode_slow_speed(raw)
    }

    fn encode_header(header: &Header) -> Vec<u8> {
        header.encode_slow_speed()
    }

    fn variant(_kind: SpacecraftKind, header: &Header) -> Result<FrameVariant> {
        Ok(slow_speed_variant(header))
    }
}

/// Six-segment frames, including bus packet frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bpsk;

impl FrameFormat for Bpsk {
    const NAME: &'static str = "bpsk";
    const HEADER_SIZE: usize = 8;
    const SEGMENT_SIZE: usize = 78;
    const SEGMENT_COUNT: usize = 6;
    const TRAILER_SIZE: usize = 96;

    fn decode_header(raw: &[u8]) -> Header {
        Header::decode_bpsk(raw)
    }

    fn encode_header(header: &Header) -> Vec<u8> {
        header.encode_bpsk()
    }

    fn variant(kind: SpacecraftKind, header: &Header) -> Result<FrameVariant> {
        bpsk_variant(kind, header)
    }
}
