//! Wire-exact frame builder for simulators and tests

use std::marker::PhantomData;

use super::{FrameFormat, Header};

/// Builds a complete frame of format `F`.
///
/// Segments are laid out in the order they are added. Missing segments, short segments
/// and the trailer are zero-filled; oversized input is truncated to the payload area.
#[derive(Debug, Clone)]
pub struct FrameEncoder<F: FrameFormat> {
    header: Header,
    payload: Vec<u8>,
    trailer: Vec<u8>,
    _format: PhantomData<F>,
}

impl<F: FrameFormat> FrameEncoder<F> {
    pub fn new(header: Header) -> Self {
        Self { header, payload: Vec::with_capacity(F::PAYLOAD_SIZE), trailer: Vec::new(), _format: PhantomData }
    }

    /// Append one segment, padded to the segment size.
    pub fn segment(mut self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        let take = bytes.len().min(F::SEGMENT_SIZE);
        self.payload.extend_from_slice(&bytes[..take]);
        self.payload.resize(self.payload.len() + (F::SEGMENT_SIZE - take), 0);
        self
    }

    /// Append raw payload bytes without segment padding, as bus packet frames use.
    pub fn payload(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.payload.extend_from_slice(bytes.as_ref());
        self
    }

    pub fn trailer(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.trailer = bytes.as_ref().to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut frame = F::encode_header(&self.header);
        frame.resize(F::HEADER_SIZE, 0);

        let mut payload = self.payload;
        payload.resize(F::PAYLOAD_SIZE, 0);
        frame.extend_from_slice(&payload);

        let mut trailer = self.trailer;
        trailer.resize(F::TRAILER_SIZE, 0);
        frame.extend_from_slice(&trailer);

        frame
    }
}
