//! End-to-end decoding through the public API: YAML directory, byte source,
//! deframing, persistence queue and store worker.

use std::sync::Arc;

use foxtlm::frame::{Bpsk, FrameEncoder, Header, ModeFlags, SlowSpeed, bpsk_types};
use foxtlm::payload::{BusPacket, RecordBody, ScanLine, StoreRecord};
use foxtlm::sources::{ChannelSource, ReplaySource};
use foxtlm::spacecraft::LayoutKind;
use foxtlm::{
    DecoderConfig, Downlink, MemoryStore, PayloadKind, SpacecraftDirectory, SpacecraftRegistry, StorageBackend,
    TelemetryError,
};
use futures::StreamExt;

const REGISTRY: &str = r#"
spacecraft:
  - id: 1
    name: AO-85
    kind: standard
    layouts:
      rttelemetry:
        - { name: BATT_A_V, bits: 12, units: V, conversion: { type: linear, scale: 0.01, offset: 0.0 } }
        - { name: PANEL_TEMP, bits: 8, conversion: { type: signed } }
        - { name: RESETS, bits: 16 }
      wodtelemetry:
        - { name: WOD_BATT_V, bits: 12 }
      wodradtelemetry:
        - { name: WOD_RAD_STATE, bits: 8 }
      radtelemetry:
        - { name: RAD_STATE, bits: 8 }
      maxtelemetry:
        - { name: BATT_A_V, bits: 12 }
      mintelemetry:
        - { name: BATT_A_V, bits: 12 }
  - id: 6
    name: HuskySat-1
    kind: uw_experiment
    layouts:
      rttelemetry:
        - { name: BATT_A_V, bits: 12 }
      wodtelemetry:
        - { name: WOD_BATT_V, bits: 12 }
      wodradtelemetry:
        - { name: WOD_EXP_STATE, bits: 8 }
      radtelemetry: []
"#;

fn directory() -> Arc<SpacecraftRegistry> {
    Arc::new(SpacecraftRegistry::from_yaml(REGISTRY).expect("registry parses"))
}

fn realtime_frame(uptime: u32) -> Vec<u8> {
    let registry = directory();
    let rt = registry.layout(1, LayoutKind::RealTime).expect("rt layout");
    let rt_bytes = rt.encode(&[412, 0xF6, 33]).expect("values fit");

    FrameEncoder::<Bpsk>::new(Header::new(1, bpsk_types::REAL_TIME, 33, uptime))
        .segment([0u8; 0])
        .segment([0u8; 0])
        .segment([0u8; 0])
        .segment([0u8; 0])
        .segment(rt_bytes)
        .build()
}

fn field_records(records: &[StoreRecord], kind: PayloadKind) -> Vec<&StoreRecord> {
    records.iter().filter(|record| record.key.kind == kind).collect()
}

#[tokio::test]
async fn realtime_values_reach_storage_with_conversions() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let config = DecoderConfig::default();
    let source = ReplaySource::from_bytes(realtime_frame(5_000), &config.replay);
    let store = MemoryStore::new();

    let downlink = Downlink::start::<Bpsk, _, _>(source, directory(), store.clone(), config).await?;
    let report = downlink.join().await?;

    assert_eq!(report.decode.decodable, 1);
    let records = store.records();
    let kinds: Vec<_> = records.iter().map(|record| record.key.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PayloadKind::WodRad,
            PayloadKind::Wod,
            PayloadKind::WodRad,
            PayloadKind::Wod,
            PayloadKind::RealTime,
            PayloadKind::RadExp
        ]
    );

    let rt = field_records(&records, PayloadKind::RealTime);
    assert_eq!(rt.len(), 1);
    assert_eq!(rt[0].key.stamp.uptime, 5_000);
    assert_eq!(rt[0].key.stamp.resets, 33);
    let RecordBody::Fields(fields) = &rt[0].body else { panic!("expected fields") };
    assert!((fields.value("BATT_A_V").unwrap() - 4.12).abs() < 1e-9);
    assert_eq!(fields.value("PANEL_TEMP"), Some(-10.0));
    assert_eq!(fields.raw("RESETS"), Some(33));
    assert_eq!(fields.get("BATT_A_V").and_then(|f| f.units.as_deref()), Some("V"));
    Ok(())
}

#[tokio::test]
async fn corrupt_frames_do_not_disturb_neighbours() -> anyhow::Result<()> {
    let mut stream = realtime_frame(1);
    stream.extend(FrameEncoder::<Bpsk>::new(Header::new(4, bpsk_types::REAL_TIME, 0, 2)).build());
    stream.extend(FrameEncoder::<Bpsk>::new(Header::new(1, 9, 0, 3)).build());
    stream.extend(realtime_frame(4));

    let config = DecoderConfig::default();
    let source = ReplaySource::from_bytes(stream, &config.replay);
    let store = MemoryStore::new();
    let report = Downlink::start::<Bpsk, _, _>(source, directory(), store.clone(), config).await?.join().await?;

    assert_eq!(report.decode.frames, 4);
    assert_eq!(report.decode.corrupt, 2);
    assert_eq!(report.store.committed, 12);

    let uptimes: Vec<u32> = store.records().iter().map(|record| record.key.stamp.uptime).collect();
    assert_eq!(uptimes, [vec![1; 6], vec![4; 6]].concat());
    Ok(())
}

#[tokio::test]
async fn bus_packet_frame_stores_each_packet() -> anyhow::Result<()> {
    let mut payload = Vec::new();
    for id in [0x101u16, 0x102, 0x103] {
        payload.extend(BusPacket::new(id, vec![0x5A; 6]).encode());
    }
    let header = Header::new(6, bpsk_types::BUS_PACKET_SCIENCE, 12, 77_000)
        .with_modes(ModeFlags { science: true, ..ModeFlags::default() });
    let frame = FrameEncoder::<Bpsk>::new(header).payload(payload).build();

    let (sender, source) = ChannelSource::new(4);
    let store = MemoryStore::new();
    let downlink = Downlink::start::<Bpsk, _, _>(source, directory(), store.clone(), DecoderConfig::default()).await?;
    let mut updates = downlink.frame_updates();

    // Split across chunks the way a demodulator would deliver it
    for chunk in frame.chunks(100) {
        sender.send(chunk.to_vec()).await?;
    }
    let summary = updates.next().await.expect("frame published");
    assert_eq!(summary.segment_kinds, vec![PayloadKind::Experiment]);
    assert_eq!(summary.header.and_then(|h| h.modes).map(|m| m.science), Some(true));

    drop(sender);
    downlink.join().await?;

    let records = store.records();
    assert_eq!(records.len(), 3);
    for (serial, record) in records.iter().enumerate() {
        assert_eq!(record.key.stamp, header.stamp());
        assert_eq!(record.key.serial, serial as u16);
        assert!(matches!(&record.body, RecordBody::BusPacket(packet) if packet.data.len() == 6));
    }
    Ok(())
}

#[tokio::test]
async fn slow_speed_fallback_frame_is_stored_as_realtime() -> anyhow::Result<()> {
    let registry = directory();
    let rt = registry.layout(1, LayoutKind::RealTime).expect("rt layout");
    let frame = FrameEncoder::<SlowSpeed>::new(Header::new(1, 12, 2, 600))
        .segment(rt.encode(&[100, 1, 2])?)
        .build();
    assert_eq!(frame.len(), 96);

    let config = DecoderConfig::default();
    let source = ReplaySource::from_bytes(frame, &config.replay);
    let store = MemoryStore::new();
    let report = Downlink::start::<SlowSpeed, _, _>(source, registry, store.clone(), config).await?.join().await?;

    assert_eq!(report.decode.decodable, 1);
    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key.kind, PayloadKind::RealTime);
    Ok(())
}

#[tokio::test]
async fn replay_from_file() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("foxtlm-replay-{}.bin", std::process::id()));
    let mut bytes = realtime_frame(10);
    bytes.extend(realtime_frame(11));
    std::fs::write(&path, &bytes)?;

    let store = MemoryStore::new();
    let config = DecoderConfig::from_yaml("replay: { chunk_size: 100 }")?;
    let downlink = Downlink::replay::<Bpsk, _, _>(&path, directory(), store.clone(), config).await?;
    let report = downlink.join().await?;
    std::fs::remove_file(&path)?;

    assert_eq!(report.decode.frames, 2);
    assert_eq!(store.records().len(), 12);
    Ok(())
}

struct LockedStore;

#[async_trait::async_trait]
impl StorageBackend for LockedStore {
    async fn open(&mut self) -> foxtlm::Result<()> {
        Err(TelemetryError::backend_unavailable("store is locked by another decoder"))
    }

    async fn store(&mut self, _record: &StoreRecord) -> foxtlm::Result<()> {
        Ok(())
    }

    async fn store_scan_line(&mut self, _line: &ScanLine) -> foxtlm::Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> foxtlm::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn unopenable_backend_aborts_startup() {
    let (_sender, source) = ChannelSource::new(1);
    let result = Downlink::start::<Bpsk, _, _>(source, directory(), LockedStore, DecoderConfig::default()).await;

    let Err(err) = result else { panic!("startup should fail") };
    assert!(err.is_fatal());
    assert!(!err.recovery_suggestions().is_empty());
}
