//! Camera scan lines
//!
//! A camera segment is a list of lines, each `picture counter (1) | scan line (2, BE) |
//! length (1) | data`. A zero length ends the list. Lines are never stored as a
//! segment, only one by one.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::SpacecraftStamp;

/// Lines per picture. Higher line numbers are corrupt.
pub const MAX_SCAN_LINES: u16 = 60;

/// Size of the line header on the wire.
pub const SCAN_LINE_HEADER_SIZE: usize = 4;

/// One line of a picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanLine {
    /// Stamped when the line is handed to storage
    pub stamp: Option<SpacecraftStamp>,
    pub picture_counter: u8,
    pub line_number: u16,
    pub data: Vec<u8>,
}

impl ScanLine {
    pub fn new(picture_counter: u8, line_number: u16, data: Vec<u8>) -> Self {
        Self { stamp: None, picture_counter, line_number, data }
    }

    pub fn stamped(mut self, stamp: SpacecraftStamp) -> Self {
        self.stamp = Some(stamp);
        self
    }

    /// Wire encoding. Data beyond 255 bytes is cut.
    pub fn encode(&self) -> Vec<u8> {
        let length = self.data.len().min(u8::MAX as usize);
        let mut bytes = vec![self.picture_counter];
        bytes.extend_from_slice(&self.line_number.to_be_bytes());
        bytes.push(length as u8);
        bytes.extend_from_slice(&self.data[..length]);
        bytes
    }
}

/// Extract scan lines from the bytes of a camera segment.
///
/// Lines with an out-of-range line number are skipped with a warning and extraction
/// continues with the next line. A line that runs past the end of the data ends the list.
pub fn extract_scan_lines(data: &[u8]) -> Vec<ScanLine> {
    let mut lines = Vec::new();
    let mut position = 0;

    while position + SCAN_LINE_HEADER_SIZE <= data.len() {
        let picture_counter = data[position];
        let line_number = u16::from_be_bytes([data[position + 1], data[position + 2]]);
        let length = data[position + 3] as usize;
        if length == 0 {
            break;
        }

        let start = position + SCAN_LINE_HEADER_SIZE;
        let Some(line_data) = data.get(start..start + length) else {
            warn!(picture_counter, line_number, length, "Truncated camera line, dropping rest of segment");
            break;
        };
        position = start + length;

        if line_number >= MAX_SCAN_LINES {
            warn!(picture_counter, line_number, "Corrupt camera line number, line skipped");
            continue;
        }

        lines.push(ScanLine::new(picture_counter, line_number, line_data.to_vec()));
    }

    lines
}
