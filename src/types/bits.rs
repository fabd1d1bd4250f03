//! MSB-first bit packing used by headers and layouts

/// Sequential reader over a byte slice, most significant bit first.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at bit 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Number of bits not yet read.
    pub fn remaining(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.position)
    }

    /// Current bit position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read `width` bits (1..=32) as an unsigned value.
    /// Returns None when the read would run past the end of the data.
    pub fn read(&mut self, width: u32) -> Option<u32> {
        if width == 0 || width > 32 || width as usize > self.remaining() {
            return None;
        }

        let mut value = 0u32;
        for _ in 0..width {
            let byte = self.data[self.position / 8];
            let bit = (byte >> (7 - (self.position % 8))) & 1;
            value = (value << 1) | bit as u32;
            self.position += 1;
        }
        Some(value)
    }

    /// Read a single bit as a flag.
    pub fn read_flag(&mut self) -> Option<bool> {
        self.read(1).map(|bit| bit == 1)
    }
}

/// Sequential writer producing MSB-first packed bytes.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    position: usize,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `width` bits (1..=32) of `value`.
    pub fn write(&mut self, value: u32, width: u32) {
        debug_assert!((1..=32).contains(&width));
        for shift in (0..width).rev() {
            if self.position % 8 == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> shift) & 1) as u8;
            let last = self.bytes.len() - 1;
            self.bytes[last] |= bit << (7 - (self.position % 8));
            self.position += 1;
        }
    }

    /// Append a single flag bit.
    pub fn write_flag(&mut self, flag: bool) {
        self.write(flag as u32, 1);
    }

    /// Finish and return the packed bytes, zero-padded to a whole byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Sign-extend the low `width` bits of `raw` as two's complement.
pub fn sign_extend(raw: u32, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        return raw as i64;
    }
    let shift = 64 - width;
    ((raw as i64) << shift) >> shift
}
