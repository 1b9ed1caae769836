//! Integration tests for the AppService → reader/router → feeder pipeline.
//!
//! These run on the host (x86_64) and drive the full tick loop with a
//! scripted board: contact samples, RFID frames on the UART, and the
//! feeder relay, without any real hardware.

use hydrapurr::adapters::storage::StoredConfig;
use hydrapurr::app::commands::AppCommand;
use hydrapurr::app::events::AppEvent;
use hydrapurr::app::ports::ConfigPort;
use hydrapurr::app::service::AppService;
use hydrapurr::config::{DeploymentConfig, SubjectEntry, SystemConfig};

use super::mock_hw::{MockBoard, MockPin, MockStorage, RecordingSink};

const HENK: &str = "61000000007E30010000000000";
const BOB: &str = "32E09C0000ED30010000000000";

/// Deterministic timing: no debounce delay, no read throttling, no
/// periodic resets, and tags that stay active for a minute.
fn test_config() -> SystemConfig {
    let mut cfg = SystemConfig::default();
    cfg.lick.debounce_ms = 0;
    cfg.reader.read_interval_ms = 0;
    cfg.reader.reset_period_ms = 0;
    cfg.reader.active_timeout_ms = 60_000;
    cfg.deployment.bout_count = 0;
    cfg
}

fn make_app(cfg: SystemConfig) -> (AppService<MockPin>, MockBoard, RecordingSink) {
    let mut app = AppService::new(cfg, MockPin::default(), 0).unwrap();
    let mut hw = MockBoard::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    (app, hw, sink)
}

/// One clean contact of `held` ms starting at `t`.
fn lick(app: &mut AppService<MockPin>, hw: &mut MockBoard, sink: &mut RecordingSink, t: u64, held: u64) {
    hw.contact = true;
    app.tick(t, hw, sink);
    hw.contact = false;
    app.tick(t + held, hw, sink);
}

/// Three 80 ms licks ending at 180, 380 and 580.
fn three_licks(app: &mut AppService<MockPin>, hw: &mut MockBoard, sink: &mut RecordingSink) {
    for t in [100, 300, 500] {
        lick(app, hw, sink, t, 80);
    }
}

fn bouts_closed(sink: &RecordingSink) -> Vec<(String, u32, u32)> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::BoutClosed {
                subject,
                bout_count,
                summary,
            } => Some((subject.clone(), *bout_count, summary.lick_count)),
            _ => None,
        })
        .collect()
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_announces_subjects_and_turns_feeder_off() {
    let (app, hw, sink) = make_app(test_config());
    assert_eq!(sink.events, vec![AppEvent::Started { subjects: 2 }]);
    assert_eq!(hw.feeder_calls, vec![false]);
    assert_eq!(app.active_subject(), "unknown");
}

// ── Licks and bouts ───────────────────────────────────────────

#[test]
fn untagged_licks_close_a_bout_for_unknown() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    three_licks(&mut app, &mut hw, &mut sink);
    assert_eq!(app.router().lick_count("unknown"), 3);

    app.tick(1579, &mut hw, &mut sink);
    assert!(bouts_closed(&sink).is_empty(), "gap of 999 ms keeps the bout open");

    app.tick(1580, &mut hw, &mut sink);
    assert_eq!(bouts_closed(&sink), vec![("unknown".to_string(), 1, 3)]);
    assert_eq!(app.router().bout_count("unknown"), 1);
    assert_eq!(app.router().lick_count("unknown"), 0);
}

#[test]
fn bout_summary_tracks_water_level() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    for (t, level) in [(100, 10.0), (300, 9.5), (500, 9.0)] {
        hw.water_level = Some(level);
        lick(&mut app, &mut hw, &mut sink, t, 80);
    }
    hw.water_level = Some(8.5);
    app.tick(1580, &mut hw, &mut sink);

    let summary = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::BoutClosed { summary, .. } => Some(summary.clone()),
            _ => None,
        })
        .expect("bout should close");
    assert_eq!(summary.start_time, 100);
    assert_eq!(summary.end_time, 1580);
    assert_eq!(summary.start_value, Some(10.0));
    assert_eq!(summary.end_value, Some(8.5));
    assert_eq!(summary.value_delta, Some(-1.5));
    assert_eq!(summary.lick_durations, vec![80, 80, 80]);
}

#[test]
fn too_few_licks_do_not_count_as_bout() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    lick(&mut app, &mut hw, &mut sink, 100, 80);
    lick(&mut app, &mut hw, &mut sink, 300, 80);
    app.tick(5_000, &mut hw, &mut sink);
    assert!(bouts_closed(&sink).is_empty());
    assert_eq!(app.router().bout_count("unknown"), 0);
    assert_eq!(app.router().lick_count("unknown"), 0);
}

// ── RFID → subject selection ──────────────────────────────────

#[test]
fn tag_read_switches_active_subject() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    hw.queue_tag(HENK);
    app.tick(10, &mut hw, &mut sink);

    assert_eq!(app.active_subject(), "henk");
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::TagRead { subject, packet } if subject == "henk" && packet.hex_key.as_str() == HENK
    )));
    assert!(sink.events.contains(&AppEvent::SubjectChanged {
        from: "unknown".into(),
        to: "henk".into(),
        at_ms: 10,
    }));

    three_licks(&mut app, &mut hw, &mut sink);
    assert_eq!(app.router().lick_count("henk"), 3);
    assert_eq!(app.router().lick_count("unknown"), 0);
}

#[test]
fn unregistered_tag_maps_to_unknown() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    hw.queue_tag("0123456789ABCDEF0123456789");
    app.tick(10, &mut hw, &mut sink);

    assert_eq!(app.active_subject(), "unknown");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::TagRead { subject, .. } if subject == "unknown")),
        1
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SubjectChanged { .. })), 0);
}

#[test]
fn lowercase_tag_resolves_to_same_subject() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    hw.queue_tag(&BOB.to_ascii_lowercase());
    app.tick(10, &mut hw, &mut sink);
    assert_eq!(app.active_subject(), "bob");
}

#[test]
fn switching_subject_mid_bout_closes_outgoing_bout() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    hw.queue_tag(HENK);
    app.tick(10, &mut hw, &mut sink);
    three_licks(&mut app, &mut hw, &mut sink);

    hw.queue_tag(BOB);
    app.tick(700, &mut hw, &mut sink);

    assert_eq!(app.active_subject(), "bob");
    assert_eq!(bouts_closed(&sink), vec![("henk".to_string(), 1, 3)]);
    assert_eq!(app.router().bout_count("bob"), 0);
}

#[test]
fn stale_tag_falls_back_to_unknown() {
    let mut cfg = test_config();
    cfg.reader.active_timeout_ms = 1_000;
    let (mut app, mut hw, mut sink) = make_app(cfg);

    hw.queue_tag(HENK);
    app.tick(10, &mut hw, &mut sink);
    app.tick(1_009, &mut hw, &mut sink);
    assert_eq!(app.active_subject(), "henk");

    app.tick(1_010, &mut hw, &mut sink);
    assert_eq!(app.active_subject(), "unknown");
    assert!(sink.events.contains(&AppEvent::SubjectChanged {
        from: "henk".into(),
        to: "unknown".into(),
        at_ms: 1_010,
    }));
}

#[test]
fn corrupt_frame_is_counted_and_ignored() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    let mut frame = hydrapurr::rfid::encode_frame(HENK.as_bytes()).unwrap();
    let checksum_at = frame.len() - 3;
    frame[checksum_at] ^= 0x01;
    hw.queue_bytes(&frame);
    app.tick(10, &mut hw, &mut sink);

    assert_eq!(app.active_subject(), "unknown");
    assert_eq!(app.reader_stats().checksum_failures, 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::TagRead { .. })), 0);
}

// ── Feeder reward ─────────────────────────────────────────────

#[test]
fn reaching_bout_target_runs_feeder_pulse() {
    let mut cfg = test_config();
    cfg.deployment = DeploymentConfig {
        bout_count: 1,
        duration_ms: 500,
    };
    let (mut app, mut hw, mut sink) = make_app(cfg);
    hw.queue_tag(HENK);
    app.tick(10, &mut hw, &mut sink);
    three_licks(&mut app, &mut hw, &mut sink);

    app.tick(1_580, &mut hw, &mut sink);
    assert!(app.is_dispensing());
    assert!(hw.feeder_on());
    assert!(sink.events.contains(&AppEvent::DispenseStarted {
        subject: "henk".into(),
        bout_count: 1,
    }));
    assert!(sink.events.contains(&AppEvent::CountsReset {
        subject: "henk".into()
    }));
    assert_eq!(app.router().bout_count("henk"), 0);

    app.tick(2_079, &mut hw, &mut sink);
    assert!(hw.feeder_on());

    app.tick(2_080, &mut hw, &mut sink);
    assert!(!hw.feeder_on());
    assert!(!app.is_dispensing());
    assert_eq!(hw.feeder_calls, vec![false, true, false]);
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::DispenseFinished {
            subject: "henk".into()
        })
    );
}

#[test]
fn disabled_deployment_never_dispenses() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    for round in 0..3u64 {
        let base = round * 2_000;
        for t in [100, 300, 500] {
            lick(&mut app, &mut hw, &mut sink, base + t, 80);
        }
        app.tick(base + 1_580, &mut hw, &mut sink);
    }
    assert_eq!(app.router().bout_count("unknown"), 3);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::DispenseStarted { .. })), 0);
    assert_eq!(hw.feeder_calls, vec![false]);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn shutdown_closes_open_bout_and_stops() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    three_licks(&mut app, &mut hw, &mut sink);

    app.handle_command(AppCommand::Shutdown, 700, &mut hw, &mut sink)
        .unwrap();

    assert_eq!(bouts_closed(&sink), vec![("unknown".to_string(), 1, 3)]);
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopped));
    assert!(!hw.feeder_on());
}

#[test]
fn reset_counts_defaults_to_active_subject() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    lick(&mut app, &mut hw, &mut sink, 100, 80);
    assert_eq!(app.router().lick_count("unknown"), 1);

    app.handle_command(
        AppCommand::ResetCounts { subject: None },
        200,
        &mut hw,
        &mut sink,
    )
    .unwrap();
    assert_eq!(app.router().lick_count("unknown"), 0);
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::CountsReset {
            subject: "unknown".into()
        })
    );
}

#[test]
fn update_config_registers_new_subject() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    let mia = "ABCDEF0123456789ABCDEF0123";
    let mut cfg = test_config();
    cfg.subjects.push(SubjectEntry {
        tag_key: mia.into(),
        name: "mia".into(),
    });

    app.handle_command(AppCommand::UpdateConfig(cfg), 50, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(sink.events.last(), Some(&AppEvent::ConfigUpdated));
    assert_eq!(app.registry().len(), 3);
    assert!(app.router().tracker("mia").is_some());
    assert!(app.is_config_dirty());

    hw.queue_tag(mia);
    app.tick(100, &mut hw, &mut sink);
    assert_eq!(app.active_subject(), "mia");
}

#[test]
fn force_reader_reset_is_accepted() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    assert!(
        app.handle_command(AppCommand::ForceReaderReset, 10, &mut hw, &mut sink)
            .is_ok()
    );
    // A second request during the pulse is a no-op, not an error.
    assert!(
        app.handle_command(AppCommand::ForceReaderReset, 20, &mut hw, &mut sink)
            .is_ok()
    );
}

// ── Config persistence ────────────────────────────────────────

#[test]
fn config_update_is_auto_saved_after_quiet_period() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    let mut store = StoredConfig::new(MockStorage::default());

    let mut cfg = test_config();
    cfg.deployment.duration_ms = 750;
    app.handle_command(AppCommand::UpdateConfig(cfg.clone()), 100, &mut hw, &mut sink)
        .unwrap();

    assert!(!app.auto_save_if_needed(5_099, &mut store));
    assert!(app.auto_save_if_needed(5_100, &mut store));
    assert!(!app.is_config_dirty());
    assert_eq!(store.load().unwrap(), cfg);
}

#[test]
fn each_config_update_restarts_quiet_period() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    let mut store = StoredConfig::new(MockStorage::default());

    let mut cfg = test_config();
    cfg.deployment.duration_ms = 750;
    app.handle_command(AppCommand::UpdateConfig(cfg.clone()), 100, &mut hw, &mut sink)
        .unwrap();
    cfg.deployment.duration_ms = 900;
    app.handle_command(AppCommand::UpdateConfig(cfg.clone()), 4_000, &mut hw, &mut sink)
        .unwrap();

    assert!(!app.auto_save_if_needed(5_100, &mut store));
    assert!(!app.auto_save_if_needed(8_999, &mut store));
    assert_eq!(store.storage().writes, 0);
    assert!(app.auto_save_if_needed(9_000, &mut store));
    assert_eq!(store.storage().writes, 1);
    assert_eq!(store.load().unwrap(), cfg);
}

#[test]
fn explicit_save_flushes_on_next_check() {
    let (mut app, mut hw, mut sink) = make_app(test_config());
    let mut store = StoredConfig::new(MockStorage::default());

    app.handle_command(AppCommand::SaveConfig, 10, &mut hw, &mut sink)
        .unwrap();
    assert!(app.auto_save_if_needed(11, &mut store));
    assert_eq!(store.storage().writes, 1);
    assert!(!app.auto_save_if_needed(20_000, &mut store));
}
