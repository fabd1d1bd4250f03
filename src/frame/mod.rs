//! Incremental frame assembly.
//!
//! A [`Frame`] consumes bytes one at a time through [`Frame::feed`]. The header has to
//! be decoded before anything else is known: spacecraft and frame type decide how many
//! payload segments follow and of which kinds. Once the header's last byte arrives the
//! frame asks the spacecraft directory for the spacecraft, resolves the variant table
//! and allocates its segments exactly once.
//!
//! Corruption is a sticky flag, not an error return. A corrupt frame keeps counting bytes
//! so the caller stays aligned with the fixed frame boundary on the wire.
//!
//! ```text
//! Empty ─► HeaderFilling ─► Assembling ─► Complete
//!                │               │
//!                └──────►  Corrupt (absorbing)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use foxtlm::frame::{BpskFrame, FrameEncoder, Header, bpsk_types};
//! use foxtlm::spacecraft::{LayoutKind, Spacecraft, SpacecraftKind, SpacecraftRegistry};
//! use foxtlm::types::{BitArrayLayout, LayoutField};
//!
//! let wod = BitArrayLayout::new("wodtelemetry", vec![LayoutField::new("BATT_V", 12)]).unwrap();
//! let mut registry = SpacecraftRegistry::new();
//! registry
//!     .insert(Spacecraft::new(2, "Fox-1B", SpacecraftKind::Standard).with_layout(LayoutKind::Wod, wod))
//!     .unwrap();
//!
//! let header = Header::new(2, bpsk_types::WOD_BEACON, 7, 3600);
//! let bytes = FrameEncoder::<foxtlm::frame::Bpsk>::new(header).build();
//!
//! let mut frame = BpskFrame::new(Arc::new(registry));
//! for byte in bytes {
//!     frame.feed(byte);
//! }
//! assert!(frame.is_decodable());
//! assert_eq!(frame.segments().len(), 6);
//! ```

use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::payload::{BusPacket, PayloadKind, PayloadSegment};
use crate::spacecraft::{Spacecraft, SpacecraftDirectory};
use crate::store::{PersistenceQueue, QueueEntry};
use crate::types::BitArrayLayout;
use crate::TelemetryError;

mod encode;
mod format;
mod header;
mod variant;

pub use encode::FrameEncoder;
pub use format::{Bpsk, FrameFormat, SlowSpeed};
pub use header::{Header, MAX_SPACECRAFT_ID, MAX_UPTIME, ModeFlags};
pub use variant::{FrameVariant, bpsk_types, bpsk_variant, slow_speed_types, slow_speed_variant};

/// Legacy single-payload frame.
pub type SlowSpeedFrame = Frame<SlowSpeed>;

/// Six-segment BPSK frame.
pub type BpskFrame = Frame<Bpsk>;

/// Observable assembly state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameState {
    Empty,
    HeaderFilling,
    Assembling,
    Complete,
    Corrupt,
}

/// Compact description of an assembled frame, published to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub format: &'static str,
    pub state: FrameState,
    pub header: Option<Header>,
    pub spacecraft_name: Option<String>,
    pub segment_kinds: Vec<PayloadKind>,
    /// Description of what made the frame corrupt
    pub fault: Option<String>,
}

/// Frame assembler for format `F`.
pub struct Frame<F: FrameFormat> {
    directory: Arc<dyn SpacecraftDirectory>,
    bytes: Box<[u8]>,
    consumed: usize,
    stored: usize,
    corrupt: bool,
    fault: Option<TelemetryError>,
    header: Option<Header>,
    spacecraft: Option<Arc<Spacecraft>>,
    variant: Option<FrameVariant>,
    segments: Vec<PayloadSegment>,
    overrun: usize,
    _format: PhantomData<F>,
}

impl<F: FrameFormat> Frame<F> {
    pub fn new(directory: Arc<dyn SpacecraftDirectory>) -> Self {
        Self {
            directory,
            bytes: vec![0u8; F::TOTAL_SIZE].into_boxed_slice(),
            consumed: 0,
            stored: 0,
            corrupt: false,
            fault: None,
            header: None,
            spacecraft: None,
            variant: None,
            segments: Vec::new(),
            overrun: 0,
            _format: PhantomData,
        }
    }

    /// Total bytes in a frame of this format.
    pub const fn total_size() -> usize {
        F::TOTAL_SIZE
    }

    /// Consume the next byte of the stream.
    pub fn feed(&mut self, byte: u8) {
        if self.consumed >= F::TOTAL_SIZE {
            self.overrun += 1;
            if self.overrun == 1 {
                let err = TelemetryError::ProtocolOverrun { frame_size: F::TOTAL_SIZE };
                warn!(format = F::NAME, "{}", err);
            } else {
                trace!(format = F::NAME, overrun = self.overrun, "Byte past end of frame discarded");
            }
            return;
        }

        let offset = self.consumed;
        self.consumed += 1;

        if self.corrupt {
            return;
        }

        self.bytes[offset] = byte;
        self.stored = self.consumed;

        if offset < F::HEADER_SIZE {
            if self.consumed == F::HEADER_SIZE {
                self.freeze_header();
            }
            return;
        }

        let payload_offset = offset - F::HEADER_SIZE;
        if payload_offset < F::PAYLOAD_SIZE {
            self.route_payload_byte(payload_offset, byte);
        }
    }

    /// Feed a run of bytes, stopping at the frame boundary.
    /// Returns the number of bytes consumed.
    pub fn feed_all(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(self.remaining());
        for &byte in &bytes[..take] {
            self.feed(byte);
        }
        take
    }

    fn freeze_header(&mut self) {
        let header = F::decode_header(&self.bytes[..F::HEADER_SIZE]);
        self.header = Some(header);
        debug!(
            format = F::NAME,
            spacecraft = header.spacecraft_id,
            frame_type = header.frame_type,
            resets = header.resets,
            uptime = header.uptime,
            "Decoded frame header"
        );

        let Some(spacecraft) = self.directory.spacecraft_by_header_id(header.spacecraft_id) else {
            self.mark_corrupt(TelemetryError::UnknownSpacecraft { id: header.spacecraft_id });
            return;
        };

        let variant = match F::variant(spacecraft.kind, &header) {
            Ok(variant) => variant,
            Err(err) => {
                self.mark_corrupt(err);
                return;
            }
        };

        let capacity = if variant.bus_packet { F::PAYLOAD_SIZE } else { F::SEGMENT_SIZE };
        let mut segments = Vec::with_capacity(variant.slots.len());
        for (slot, kind) in variant.slots.iter().enumerate() {
            let layout = match kind.layout_kind() {
                Some(layout_kind) => {
                    match self.directory.layout(header.spacecraft_id, layout_kind) {
                        Some(layout) => layout,
                        None => {
                            self.mark_corrupt(TelemetryError::MissingLayout {
                                spacecraft_id: header.spacecraft_id,
                                layout: layout_kind.name().to_string(),
                            });
                            return;
                        }
                    }
                }
                None => Arc::new(BitArrayLayout::empty(kind.name())),
            };
            segments.push(PayloadSegment::new(*kind, header.stamp(), slot as u8, capacity, layout));
        }

        trace!(format = F::NAME, segments = segments.len(), bus_packet = variant.bus_packet, "Allocated payload segments");
        self.spacecraft = Some(spacecraft);
        self.variant = Some(variant);
        self.segments = segments;
    }

    fn route_payload_byte(&mut self, payload_offset: usize, byte: u8) {
        let bus_packet = self.variant.as_ref().is_some_and(|variant| variant.bus_packet);
        let index = if bus_packet { 0 } else { payload_offset / F::SEGMENT_SIZE };
        if let Some(segment) = self.segments.get_mut(index) {
            segment.add_byte(byte);
        }
    }

    fn mark_corrupt(&mut self, fault: TelemetryError) {
        warn!(format = F::NAME, "Decode not possible: {}", fault);
        self.corrupt = true;
        self.fault = Some(fault);
    }

    pub fn state(&self) -> FrameState {
        if self.corrupt {
            FrameState::Corrupt
        } else if self.consumed == 0 {
            FrameState::Empty
        } else if self.consumed < F::HEADER_SIZE {
            FrameState::HeaderFilling
        } else if self.consumed < F::TOTAL_SIZE {
            FrameState::Assembling
        } else {
            FrameState::Complete
        }
    }

    /// All bytes of the frame have been consumed, corrupt or not.
    pub fn is_complete(&self) -> bool {
        self.consumed == F::TOTAL_SIZE
    }

    pub fn is_corrupt(&self) -> bool {
        self.corrupt
    }

    /// Complete and not corrupt.
    pub fn is_decodable(&self) -> bool {
        self.is_complete() && !self.corrupt
    }

    /// What made the frame corrupt, if it is.
    pub fn fault(&self) -> Option<&TelemetryError> {
        self.fault.as_ref()
    }

    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        F::TOTAL_SIZE - self.consumed
    }

    /// Bytes offered after the frame was complete.
    pub fn overrun_bytes(&self) -> usize {
        self.overrun
    }

    /// Raw wire bytes kept so far. A corrupt frame keeps nothing past the byte that
    /// made it corrupt.
    pub fn raw(&self) -> &[u8] {
        &self.bytes[..self.stored]
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn spacecraft(&self) -> Option<&Arc<Spacecraft>> {
        self.spacecraft.as_ref()
    }

    pub fn variant(&self) -> Option<&FrameVariant> {
        self.variant.as_ref()
    }

    pub fn segments(&self) -> &[PayloadSegment] {
        &self.segments
    }

    pub fn segment_kinds(&self) -> Vec<PayloadKind> {
        self.segments.iter().map(PayloadSegment::kind).collect()
    }

    /// Bus packets of every experiment segment, in slot order.
    pub fn bus_packets(&self) -> Vec<BusPacket> {
        self.segments.iter().flat_map(|segment| segment.bus_packets().iter().cloned()).collect()
    }

    /// Bus packets to forward to a local packet server.
    ///
    /// None unless the frame is decodable and its spacecraft has forwarding enabled.
    pub fn local_server_packets(&self) -> Option<Vec<BusPacket>> {
        let spacecraft = self.spacecraft.as_ref()?;
        if !spacecraft.send_to_local_server || !self.is_decodable() {
            return None;
        }
        Some(self.bus_packets())
    }

    /// Force field decoding of every segment. Failures are logged per segment and
    /// counted, they never stop sibling segments.
    pub fn materialize_all(&self) -> usize {
        let mut failures = 0;
        for segment in &self.segments {
            if let Err(err) = segment.materialize() {
                failures += 1;
                warn!(format = F::NAME, slot = segment.slot(), "{}", err);
            }
        }
        failures
    }

    pub fn summary(&self) -> FrameSummary {
        FrameSummary {
            format: F::NAME,
            state: self.state(),
            header: self.header,
            spacecraft_name: self.spacecraft.as_ref().map(|spacecraft| spacecraft.name.clone()),
            segment_kinds: self.segment_kinds(),
            fault: self.fault.as_ref().map(ToString::to_string),
        }
    }

    /// Move the segments of a decodable frame into the persistence queue, contiguously
    /// and in segment order. Returns the number of entries added.
    pub fn enqueue(self, queue: &PersistenceQueue) -> usize {
        if !self.is_decodable() {
            debug!(format = F::NAME, state = ?self.state(), "Frame not enqueued");
            return 0;
        }
        let Some(header) = self.header else {
            return 0;
        };
        let stamp = header.stamp();
        let entries: Vec<QueueEntry> =
            self.segments.into_iter().map(|segment| QueueEntry::new(stamp, segment)).collect();
        let count = entries.len();
        queue.add_all(entries);
        count
    }
}

impl<F: FrameFormat> fmt::Debug for Frame<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("format", &F::NAME)
            .field("consumed", &self.consumed)
            .field("corrupt", &self.corrupt)
            .field("header", &self.header)
            .field("segments", &self.segments.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::MAX_BUS_PACKET_DATA;
    use crate::spacecraft::LayoutKind;
    use crate::test_utils::{test_directory, EXPERIMENT_ID, STANDARD_ID, UNCONFIGURED_ID};
    use proptest::prelude::*;

    fn feed<F: FrameFormat>(frame: &mut Frame<F>, bytes: &[u8]) {
        for &byte in bytes {
            frame.feed(byte);
        }
    }

    #[test]
    fn slow_speed_realtime_frame() {
        let header = Header::new(STANDARD_ID, slow_speed_types::REAL_TIME, 3, 1000);
        let bytes = FrameEncoder::<SlowSpeed>::new(header).build();
        assert_eq!(bytes.len(), 96);

        let mut frame = SlowSpeedFrame::new(test_directory());
        feed(&mut frame, &bytes);

        assert!(frame.is_decodable());
        assert_eq!(frame.state(), FrameState::Complete);
        assert_eq!(frame.segment_kinds(), vec![PayloadKind::RealTime]);
        assert!(!frame.variant().unwrap().fallback);
    }

    #[test]
    fn slow_speed_out_of_range_type_falls_back() {
        let header = Header::new(STANDARD_ID, 9, 3, 1000);
        let mut frame = SlowSpeedFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<SlowSpeed>::new(header).build());

        assert!(frame.is_decodable());
        assert!(!frame.is_corrupt());
        assert_eq!(frame.segment_kinds(), vec![PayloadKind::RealTime]);
        assert!(frame.variant().unwrap().fallback);
    }

    #[test]
    fn unconfigured_spacecraft_marks_corrupt_after_header() {
        let header = Header::new(UNCONFIGURED_ID, bpsk_types::REAL_TIME, 0, 0);
        let bytes = FrameEncoder::<Bpsk>::new(header).build();
        let mut frame = BpskFrame::new(test_directory());

        feed(&mut frame, &bytes[..Bpsk::HEADER_SIZE - 1]);
        assert_eq!(frame.state(), FrameState::HeaderFilling);
        assert!(!frame.is_corrupt());

        frame.feed(bytes[Bpsk::HEADER_SIZE - 1]);
        assert!(frame.is_corrupt());
        assert!(matches!(frame.fault(), Some(TelemetryError::UnknownSpacecraft { id }) if *id == UNCONFIGURED_ID));

        feed(&mut frame, &bytes[Bpsk::HEADER_SIZE..]);
        assert!(frame.is_complete());
        assert!(!frame.is_decodable());
        assert!(frame.segments().is_empty());
        assert_eq!(frame.bytes_consumed(), Bpsk::TOTAL_SIZE);
    }

    #[test]
    fn corrupt_frame_keeps_only_its_header() {
        let header = Header::new(UNCONFIGURED_ID, bpsk_types::REAL_TIME, 0, 0);
        let header_bytes = FrameEncoder::<Bpsk>::new(header).build()[..Bpsk::HEADER_SIZE].to_vec();
        let mut frame = BpskFrame::new(test_directory());
        feed(&mut frame, &header_bytes);
        assert!(frame.is_corrupt());

        feed(&mut frame, &[0xAB; Bpsk::TOTAL_SIZE - Bpsk::HEADER_SIZE]);

        assert!(frame.is_complete());
        assert_eq!(frame.bytes_consumed(), Bpsk::TOTAL_SIZE);
        assert_eq!(frame.raw(), header_bytes.as_slice());
        assert!(!frame.raw().contains(&0xAB));
    }

    #[test]
    fn bpsk_unknown_type_marks_corrupt() {
        let header = Header::new(STANDARD_ID, 12, 0, 0);
        let mut frame = BpskFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<Bpsk>::new(header).build());

        assert!(frame.is_corrupt());
        assert!(matches!(frame.fault(), Some(TelemetryError::UnknownFrameType { frame_type: 12, .. })));
        assert!(frame.segments().is_empty());
    }

    #[test]
    fn bytes_route_to_segments_by_offset() {
        let header = Header::new(STANDARD_ID, bpsk_types::WOD_BEACON, 1, 2);
        let mut encoder = FrameEncoder::<Bpsk>::new(header);
        for slot in 0..6u8 {
            encoder = encoder.segment(vec![slot + 1; Bpsk::SEGMENT_SIZE]);
        }
        let mut frame = BpskFrame::new(test_directory());
        feed(&mut frame, &encoder.build());

        for (slot, segment) in frame.segments().iter().enumerate() {
            assert!(segment.is_full());
            assert!(segment.raw().iter().all(|&b| b == slot as u8 + 1));
            assert_eq!(segment.slot() as usize, slot);
            assert_eq!(segment.stamp(), header.stamp());
        }
    }

    #[test]
    fn bus_packet_frame_takes_whole_payload() {
        let header = Header::new(EXPERIMENT_ID, bpsk_types::BUS_PACKET_SCIENCE, 4, 77);
        let mut payload = Vec::new();
        for id in 0..40u16 {
            payload.extend(BusPacket::new(0x100 + id, vec![id as u8; 8]).encode());
        }
        assert!(payload.len() > Bpsk::SEGMENT_SIZE);

        let mut frame = BpskFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<Bpsk>::new(header).payload(payload).build());

        assert!(frame.is_decodable());
        assert_eq!(frame.segments().len(), 1);
        let segment = &frame.segments()[0];
        assert_eq!(segment.capacity(), Bpsk::PAYLOAD_SIZE);
        assert!(segment.is_full());
        assert_eq!(segment.bus_packets().len(), 40);
    }

    #[test]
    fn bus_packets_gather_across_experiment_segments() {
        let directory = test_directory();
        let wod_rad = directory.layout(EXPERIMENT_ID, LayoutKind::WodRad).unwrap();
        let prefix = vec![0u8; wod_rad.byte_len()];
        let with_packet = |mut bytes: Vec<u8>, packet: &BusPacket| {
            bytes.extend(packet.encode());
            bytes
        };
        let packets = [
            BusPacket::new(0x201, vec![1]),
            BusPacket::new(0x202, vec![2, 2]),
            BusPacket::new(0x203, vec![3, 3, 3]),
        ];

        // WodExperiment, Wod, WodExperiment, Wod, RealTime, Experiment
        let header = Header::new(EXPERIMENT_ID, bpsk_types::REAL_TIME, 1, 500);
        let bytes = FrameEncoder::<Bpsk>::new(header)
            .segment(with_packet(prefix.clone(), &packets[0]))
            .segment([0u8; 0])
            .segment(with_packet(prefix, &packets[1]))
            .segment([0u8; 0])
            .segment([0u8; 0])
            .segment(packets[2].encode())
            .build();

        let mut frame = BpskFrame::new(directory);
        feed(&mut frame, &bytes);

        assert!(frame.is_decodable());
        assert_eq!(frame.bus_packets(), packets.to_vec());
        assert_eq!(frame.local_server_packets(), Some(packets.to_vec()));
    }

    #[test]
    fn local_server_forwarding_follows_spacecraft_flag() {
        let mut payload = BusPacket::new(0x0AA, vec![9; 4]).encode();
        payload.extend(BusPacket::new(0x0AB, vec![]).encode());

        let forwarded = Header::new(EXPERIMENT_ID, bpsk_types::BUS_PACKET_CAMERA, 0, 1);
        let mut frame = BpskFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<Bpsk>::new(forwarded).payload(&payload).build());
        assert_eq!(frame.local_server_packets().map(|packets| packets.len()), Some(2));

        let standard = Header::new(STANDARD_ID, bpsk_types::REAL_TIME, 0, 1);
        let mut frame = BpskFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<Bpsk>::new(standard).build());
        assert!(frame.bus_packets().is_empty());
        assert_eq!(frame.local_server_packets(), None);

        let mut partial = BpskFrame::new(test_directory());
        feed(&mut partial, &FrameEncoder::<Bpsk>::new(forwarded).payload(&payload).build()[..100]);
        assert_eq!(partial.local_server_packets(), None);
    }

    #[test]
    fn bytes_past_end_are_discarded() {
        let header = Header::new(STANDARD_ID, slow_speed_types::MAX_VALUES, 0, 0);
        let mut frame = SlowSpeedFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<SlowSpeed>::new(header).build());
        let before = frame.raw().to_vec();

        frame.feed(0xAA);
        frame.feed(0xBB);

        assert_eq!(frame.overrun_bytes(), 2);
        assert_eq!(frame.bytes_consumed(), SlowSpeed::TOTAL_SIZE);
        assert_eq!(frame.raw(), before.as_slice());
        assert!(frame.is_decodable());
    }

    #[test]
    fn feed_all_stops_at_boundary() {
        let header = Header::new(STANDARD_ID, slow_speed_types::MIN_VALUES, 0, 0);
        let mut bytes = FrameEncoder::<SlowSpeed>::new(header).build();
        bytes.extend([1, 2, 3]);

        let mut frame = SlowSpeedFrame::new(test_directory());
        assert_eq!(frame.feed_all(&bytes), SlowSpeed::TOTAL_SIZE);
        assert_eq!(frame.overrun_bytes(), 0);
        assert!(frame.is_complete());
    }

    #[test]
    fn enqueue_moves_segments_in_order() {
        let header = Header::new(STANDARD_ID, bpsk_types::REAL_TIME, 2, 50);
        let mut frame = BpskFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<Bpsk>::new(header).build());
        let kinds = frame.segment_kinds();

        let queue = PersistenceQueue::new();
        assert_eq!(frame.enqueue(&queue), 6);

        let drained = queue.drain();
        let drained_kinds: Vec<_> = drained.iter().map(|entry| entry.segment.kind()).collect();
        assert_eq!(drained_kinds, kinds);
        assert!(drained.iter().all(|entry| entry.stamp == header.stamp()));
    }

    #[test]
    fn corrupt_frames_are_not_enqueued() {
        let header = Header::new(UNCONFIGURED_ID, 0, 0, 0);
        let mut frame = SlowSpeedFrame::new(test_directory());
        feed(&mut frame, &FrameEncoder::<SlowSpeed>::new(header).build());

        let queue = PersistenceQueue::new();
        assert_eq!(frame.enqueue(&queue), 0);
        assert!(queue.is_empty());
    }

    fn kinds_for(frame_type: u8, id: u32) -> Vec<PayloadKind> {
        let directory = test_directory();
        let spacecraft = directory.spacecraft_by_header_id(id).unwrap();
        bpsk_variant(spacecraft.kind, &Header::new(id, frame_type, 0, 0)).unwrap().slots
    }

    fn assert_frozen_after_corruption<F: FrameFormat>(trailing: &[u8]) -> Result<(), TestCaseError> {
        let header = Header::new(UNCONFIGURED_ID, 1, 7, 99);
        let encoded = FrameEncoder::<F>::new(header).build();
        let mut frame = Frame::<F>::new(test_directory());
        feed(&mut frame, &encoded[..F::HEADER_SIZE]);

        prop_assert!(frame.is_corrupt());
        let raw = frame.raw().to_vec();
        prop_assert_eq!(raw.len(), F::HEADER_SIZE);
        let fault = frame.fault().map(ToString::to_string);
        prop_assert!(fault.is_some());

        for (index, &byte) in trailing.iter().enumerate() {
            frame.feed(byte);
            prop_assert!(frame.is_corrupt());
            prop_assert!(!frame.is_decodable());
            prop_assert_eq!(frame.raw(), raw.as_slice());
            prop_assert_eq!(frame.fault().map(ToString::to_string), fault.clone());
            prop_assert_eq!(frame.is_complete(), F::HEADER_SIZE + index + 1 >= F::TOTAL_SIZE);
            prop_assert!(frame.segments().is_empty());
        }
        Ok(())
    }

    fn masked(value: u32, bits: u32) -> u32 {
        if bits == 32 { value } else { value & ((1 << bits) - 1) }
    }

    proptest! {
        #[test]
        fn short_sequences_never_complete(bytes in prop::collection::vec(any::<u8>(), 0..Bpsk::TOTAL_SIZE)) {
            let mut frame = BpskFrame::new(test_directory());
            feed(&mut frame, &bytes);
            prop_assert!(!frame.is_complete());
            prop_assert_eq!(frame.bytes_consumed(), bytes.len());
        }

        #[test]
        fn valid_variants_produce_declared_kinds(
            frame_type in 0u8..bpsk_types::TYPES_OF_FRAME,
            id in prop::sample::select(vec![STANDARD_ID, EXPERIMENT_ID]),
            resets in any::<u16>(),
            uptime in 0u32..=MAX_UPTIME,
        ) {
            let header = Header::new(id, frame_type, resets, uptime);
            let mut frame = BpskFrame::new(test_directory());
            feed(&mut frame, &FrameEncoder::<Bpsk>::new(header).build());

            prop_assert!(frame.is_decodable());
            prop_assert_eq!(frame.segment_kinds(), kinds_for(frame_type, id));
            prop_assert_eq!(frame.header().map(Header::stamp), Some(header.stamp()));
        }

        #[test]
        fn corrupt_bpsk_frame_is_frozen(trailing in prop::collection::vec(any::<u8>(), 0..700)) {
            assert_frozen_after_corruption::<Bpsk>(&trailing)?;
        }

        #[test]
        fn corrupt_slow_speed_frame_is_frozen(trailing in prop::collection::vec(any::<u8>(), 0..200)) {
            assert_frozen_after_corruption::<SlowSpeed>(&trailing)?;
        }

        #[test]
        fn round_trip_reproduces_header_and_fields(
            resets in any::<u16>(),
            uptime in 0u32..=MAX_UPTIME,
            values in prop::collection::vec(0u32..4096, 4),
        ) {
            let directory = test_directory();
            let layout = directory.layout(STANDARD_ID, crate::spacecraft::LayoutKind::RealTime).unwrap();
            let header = Header::new(STANDARD_ID, slow_speed_types::REAL_TIME, resets, uptime);
            let bytes = FrameEncoder::<SlowSpeed>::new(header)
                .segment(layout.encode(&values).unwrap())
                .build();

            let mut frame = SlowSpeedFrame::new(directory);
            feed(&mut frame, &bytes);

            prop_assert_eq!(frame.header().copied(), Some(header));
            let fields = frame.segments()[0].fields().unwrap();
            let raws: Vec<u32> = fields.iter().map(|field| field.raw).collect();
            prop_assert_eq!(raws, values);
        }

        #[test]
        fn bpsk_round_trip_reproduces_every_segment(
            frame_type in 0u8..bpsk_types::BUS_PACKET_SCIENCE,
            id in prop::sample::select(vec![STANDARD_ID, EXPERIMENT_ID]),
            resets in any::<u16>(),
            uptime in 0u32..=MAX_UPTIME,
            seed in prop::collection::vec(any::<u32>(), 8),
        ) {
            let directory = test_directory();
            let header = Header::new(id, frame_type, resets, uptime);
            let kinds = kinds_for(frame_type, id);

            let mut encoder = FrameEncoder::<Bpsk>::new(header);
            let mut expected_values = Vec::new();
            let mut expected_packets = Vec::new();
            for (slot, kind) in kinds.iter().enumerate() {
                let layout = kind.layout_kind().and_then(|layout_kind| directory.layout(id, layout_kind)).unwrap();
                let values: Vec<u32> = layout
                    .fields()
                    .iter()
                    .zip(seed.iter().cycle().skip(slot))
                    .map(|(field, value)| masked(*value, field.bits))
                    .collect();
                let mut bytes = layout.encode(&values).unwrap();
                if kind.carries_bus_packets() {
                    let packet = BusPacket::new(0x100 + slot as u16, vec![slot as u8; slot % 9]);
                    bytes.extend(packet.encode());
                    expected_packets.push(packet);
                }
                encoder = encoder.segment(bytes);
                expected_values.push(values);
            }

            let mut frame = BpskFrame::new(directory);
            feed(&mut frame, &encoder.build());

            prop_assert!(frame.is_decodable());
            prop_assert_eq!(frame.header().copied(), Some(header));
            for (segment, values) in frame.segments().iter().zip(&expected_values) {
                let raws: Vec<u32> = segment.fields().unwrap().iter().map(|field| field.raw).collect();
                prop_assert_eq!(&raws, values);
            }
            prop_assert_eq!(frame.bus_packets(), expected_packets);
        }

        #[test]
        fn bpsk_bus_packet_round_trip(
            frame_type in prop::sample::select(vec![bpsk_types::BUS_PACKET_SCIENCE, bpsk_types::BUS_PACKET_CAMERA]),
            resets in any::<u16>(),
            uptime in 0u32..=MAX_UPTIME,
            packets in prop::collection::vec(
                (1u16..=0xFFF, prop::collection::vec(any::<u8>(), 0..=MAX_BUS_PACKET_DATA)),
                0..40,
            ),
        ) {
            let packets: Vec<BusPacket> = packets.into_iter().map(|(id, data)| BusPacket::new(id, data)).collect();
            let payload: Vec<u8> = packets.iter().flat_map(BusPacket::encode).collect();
            let header = Header::new(EXPERIMENT_ID, frame_type, resets, uptime);

            let mut frame = BpskFrame::new(test_directory());
            feed(&mut frame, &FrameEncoder::<Bpsk>::new(header).payload(payload).build());

            prop_assert!(frame.is_decodable());
            prop_assert_eq!(frame.header().copied(), Some(header));
            prop_assert_eq!(frame.segment_kinds(), vec![PayloadKind::Experiment]);
            prop_assert_eq!(frame.bus_packets(), packets);
        }
    }
}
