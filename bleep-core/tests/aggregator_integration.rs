//! Integration tests for the aggregation path
//!
//! Drives the full façade — resolve, decode, correlate, append — through the
//! public API only, with recorded and synthetic notification sequences.

use std::sync::atomic::Ordering;

use bleep_core::{
    Aggregator, ChannelKind, ChannelSpec, ChannelTable, DecodeRule, Endianness, FloatWidth,
    Lifecycle, LifecycleEvent, MemoryFeed, Notification, SensorLabel, SyntheticFeed, Value,
};

fn fixed_clock_aggregator(table: ChannelTable) -> Aggregator {
    Aggregator::new(table, Box::new(bleep_core::time::FixedClock::new(1_000)))
}

const F32_LE: DecodeRule = DecodeRule::FixedWidthFloat {
    width: FloatWidth::Four,
    endianness: Endianness::Little,
};

const TICK_TEXT: DecodeRule = DecodeRule::DelimitedText { stamp_len: 6, value_start: 6 };

/// Two channels: `c1 -> PM25 (4-byte LE float)`, `c2 -> tick`.
static TWO_CHANNELS: [ChannelSpec; 2] = [
    ChannelSpec { uuid: "c1", kind: ChannelKind::Sensor(SensorLabel::Pm25), rule: F32_LE },
    ChannelSpec { uuid: "c2", kind: ChannelKind::Tick, rule: TICK_TEXT },
];

#[test]
fn concrete_two_channel_scenario() {
    let mut agg = fixed_clock_aggregator(ChannelTable::new(&TWO_CHANNELS).unwrap());

    agg.on_notification("c2", b"023145");
    let tick = agg.current_tick().expect("tick channel minted a tick");

    agg.on_notification("c1", &23.5f32.to_le_bytes());

    let dataset = agg.snapshot();
    assert_eq!(dataset.len(), 1);

    let entry = dataset.get(SensorLabel::Pm25).unwrap();
    assert_eq!(entry.len(), 1);
    assert_eq!(entry.readings()[0].value, Value::Float(23.5));
    assert_eq!(entry.readings()[0].tick, Some(tick));
    assert_eq!(entry.first_tick(), Some(tick));
}

#[test]
fn tick_correlation_across_interleaving() {
    // [tick A, reading(L1), tick B, reading(L1), reading(L2)]
    let table = ChannelTable::bleep();
    let mut agg = fixed_clock_aggregator(table);

    let lat = "1c95d5e3-d8f7-413a-bf3d-7a2e5d7be87e";
    let lon = "d7d85823-5304-4eb3-9671-3e571fac07b9";
    let tick = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

    agg.on_notification(tick, b"000001");
    let tick_a = agg.current_tick().unwrap();

    agg.on_notification(lat, &51.5f32.to_le_bytes());

    agg.on_notification(tick, b"000002");
    let tick_b = agg.current_tick().unwrap();
    assert!(tick_b > tick_a);

    agg.on_notification(lat, &51.6f32.to_le_bytes());
    agg.on_notification(lon, &(-0.1f32).to_le_bytes());

    let dataset = agg.snapshot();
    let lat_entry = dataset.get(SensorLabel::Latitude).unwrap();
    assert_eq!(lat_entry.readings()[0].tick, Some(tick_a));
    assert_eq!(lat_entry.readings()[1].tick, Some(tick_b));
    // Entry creation tick marks "first seen", not "latest".
    assert_eq!(lat_entry.first_tick(), Some(tick_a));

    let lon_entry = dataset.get(SensorLabel::Longitude).unwrap();
    assert_eq!(lon_entry.first_tick(), Some(tick_b));
}

#[test]
fn replayed_session_counts_every_outcome() {
    let table = ChannelTable::bleep();
    let tick = "beb5483e-36e1-4688-b7f5-ea07361b26a8";
    let pm = "bf5a799d-26d0-410e-96b0-9ada1eb9f758";

    let recorded = [
        Notification::new(tick, b"000001").unwrap(),
        Notification::new(pm, &12.0f32.to_le_bytes()).unwrap(),
        // Protocol mismatch: channel the table has never heard of.
        Notification::new("not-a-real-channel", &[0xde, 0xad]).unwrap(),
        // Corrupt sample: two bytes where four are required.
        Notification::new(pm, &[0x00, 0x01]).unwrap(),
        Notification::new(pm, &13.5f32.to_le_bytes()).unwrap(),
    ];

    let mut agg = fixed_clock_aggregator(table);
    let consumed = agg.drain(&mut MemoryFeed::new(&recorded));
    assert_eq!(consumed, 5);

    // Both drops left the dataset untouched; both good readings landed.
    let dataset = agg.snapshot();
    assert_eq!(dataset.reading_count(), 2);

    let stats = agg.stats();
    assert_eq!(stats.readings_stored.load(Ordering::Relaxed), 2);
    assert_eq!(stats.ticks_observed.load(Ordering::Relaxed), 1);
    assert_eq!(stats.unknown_channel.load(Ordering::Relaxed), 1);
    assert_eq!(stats.decode_failures.load(Ordering::Relaxed), 1);
    assert_eq!(stats.store_conflicts.load(Ordering::Relaxed), 0);
}

#[test]
fn pre_tick_readings_survive_and_stay_distinguishable() {
    let mut agg = fixed_clock_aggregator(ChannelTable::new(&TWO_CHANNELS).unwrap());

    agg.on_notification("c1", &1.0f32.to_le_bytes());
    agg.on_notification("c2", b"000001");
    agg.on_notification("c1", &2.0f32.to_le_bytes());

    let entry = agg.snapshot();
    let entry = entry.get(SensorLabel::Pm25).unwrap();
    assert_eq!(entry.len(), 2);
    assert_eq!(entry.readings()[0].tick, None);
    assert!(entry.readings()[1].tick.is_some());
}

#[test]
fn disconnect_discards_and_reconnect_starts_fresh_tick_space() {
    let mut agg = fixed_clock_aggregator(ChannelTable::new(&TWO_CHANNELS).unwrap());

    agg.on_lifecycle(LifecycleEvent::Connected);
    agg.on_notification("c2", b"000001");
    let old_tick = agg.current_tick().unwrap();
    agg.on_notification("c1", &5.0f32.to_le_bytes());

    agg.on_lifecycle(LifecycleEvent::Disconnected);
    assert_eq!(agg.lifecycle(), Lifecycle::Idle);
    assert!(agg.snapshot().is_empty());
    assert!(agg.current_tick().is_none());

    // Reconnect: new session, strictly younger ticks, fresh entries.
    agg.on_lifecycle(LifecycleEvent::Connected);
    agg.on_notification("c2", b"000002");
    let new_tick = agg.current_tick().unwrap();
    assert!(new_tick > old_tick);

    agg.on_notification("c1", &6.0f32.to_le_bytes());
    let dataset = agg.snapshot();
    let entry = dataset.get(SensorLabel::Pm25).unwrap();
    assert_eq!(entry.len(), 1);
    assert_eq!(entry.first_tick(), Some(new_tick));
}

#[test]
fn reset_matches_disconnect_data_effect() {
    let mut agg = fixed_clock_aggregator(ChannelTable::new(&TWO_CHANNELS).unwrap());
    agg.on_lifecycle(LifecycleEvent::Connected);
    agg.on_notification("c2", b"000001");
    agg.on_notification("c1", &5.0f32.to_le_bytes());

    agg.reset();

    assert!(agg.snapshot().is_empty());
    assert!(agg.current_tick().is_none());
    assert_eq!(agg.lifecycle(), Lifecycle::Streaming);
}

#[test]
fn empty_ticks_advance_without_readings() {
    let mut agg = fixed_clock_aggregator(ChannelTable::new(&TWO_CHANNELS).unwrap());

    for stamp in [b"000001", b"000002", b"000003"] {
        agg.on_notification("c2", stamp);
    }

    assert!(agg.snapshot().is_empty());
    assert_eq!(agg.stats().ticks_observed.load(Ordering::Relaxed), 3);
}

#[test]
fn snapshot_mid_stream_is_isolated() {
    let table = ChannelTable::bleep();
    let mut agg = fixed_clock_aggregator(table);

    let mut first_half = SyntheticFeed::new(table, 2);
    agg.drain(&mut first_half);
    let snapshot = agg.snapshot();
    let count_at_snapshot = snapshot.reading_count();

    let mut second_half = SyntheticFeed::new(table, 5);
    agg.drain(&mut second_half);

    // The handed-out snapshot did not grow along with the live store.
    assert_eq!(snapshot.reading_count(), count_at_snapshot);
    assert!(agg.snapshot().reading_count() > count_at_snapshot);
}

#[test]
fn sub_timestamp_and_tick_are_both_exposed() {
    // Text channels carry their own peripheral-side stamp alongside the
    // correlator's tick; the export side picks whichever it trusts.
    static TEXT_TABLE: [ChannelSpec; 2] = [
        ChannelSpec {
            uuid: "tick",
            kind: ChannelKind::Tick,
            rule: TICK_TEXT,
        },
        ChannelSpec {
            uuid: "temp-text",
            kind: ChannelKind::Sensor(SensorLabel::Temperature),
            rule: DecodeRule::DelimitedText { stamp_len: 6, value_start: 6 },
        },
    ];

    let mut agg = fixed_clock_aggregator(ChannelTable::new(&TEXT_TABLE).unwrap());
    agg.on_notification("tick", b"120000");
    agg.on_notification("temp-text", b"12000321.5");

    let dataset = agg.snapshot();
    let reading = dataset.get(SensorLabel::Temperature).unwrap().readings()[0];
    assert_eq!(reading.sub_timestamp.as_str(), "120003");
    assert_eq!(reading.value.as_text(), Some("21.5"));
    assert!(reading.tick.is_some());
}
