//! Integration tests for the RFID tag reader against a scripted UART and
//! a recording reset pin.

use hydrapurr::config::ReaderConfig;
use hydrapurr::rfid::{STX, TagReader, encode_frame};

use super::mock_hw::{MockBoard, MockPin};

const HENK: &str = "61000000007E30010000000000";
const BOB: &str = "32E09C0000ED30010000000000";

fn quiet_config() -> ReaderConfig {
    ReaderConfig {
        reset_period_ms: 0,
        read_interval_ms: 0,
        ..ReaderConfig::default()
    }
}

fn reader(cfg: ReaderConfig) -> (TagReader<MockPin>, MockPin, MockBoard) {
    let pin = MockPin::default();
    let reader = TagReader::new(&cfg, pin.clone(), 0);
    (reader, pin, MockBoard::new())
}

#[test]
fn construction_releases_reset_line() {
    let (_reader, pin, _uart) = reader(ReaderConfig::default());
    assert_eq!(pin.levels(), vec![false]);
}

#[test]
fn frame_split_across_polls_is_assembled() {
    let (mut reader, _pin, mut uart) = reader(quiet_config());
    let frame = encode_frame(HENK.as_bytes()).unwrap();
    let (head, tail) = frame.split_at(11);

    uart.queue_bytes(head);
    assert!(reader.poll(10, &mut uart).is_none());

    uart.queue_bytes(tail);
    let packet = reader.poll(20, &mut uart).expect("frame completes");
    assert_eq!(packet.hex_key.as_str(), HENK);
    assert_eq!(packet.time_ms, 20);
    assert_eq!(reader.stats().accepted, 1);
}

#[test]
fn leading_noise_is_skipped() {
    let (mut reader, _pin, mut uart) = reader(quiet_config());
    uart.queue_bytes(&[0x00, 0xFF, b'Z', 0x03, 0x7E]);
    uart.queue_tag(BOB);
    let packet = reader.poll(10, &mut uart).expect("frame after noise");
    assert_eq!(packet.hex_key.as_str(), BOB);
}

#[test]
fn repeat_within_window_is_suppressed() {
    let (mut reader, _pin, mut uart) = reader(quiet_config());

    uart.queue_tag(HENK);
    assert!(reader.poll(0, &mut uart).is_some());

    uart.queue_tag(HENK);
    assert!(reader.poll(99, &mut uart).is_none());
    assert_eq!(reader.stats().duplicates, 1);

    uart.queue_tag(HENK);
    assert!(reader.poll(200, &mut uart).is_some());
}

#[test]
fn different_tag_is_never_suppressed() {
    let (mut reader, _pin, mut uart) = reader(quiet_config());
    uart.queue_tag(HENK);
    assert!(reader.poll(0, &mut uart).is_some());
    uart.queue_tag(BOB);
    assert!(reader.poll(1, &mut uart).is_some());
}

#[test]
fn unterminated_start_marker_resyncs() {
    let (mut reader, _pin, mut uart) = reader(quiet_config());
    uart.queue_bytes(&[STX]);
    uart.queue_bytes(&[b'A'; 70]);

    assert!(reader.poll(0, &mut uart).is_none());
    assert!(reader.poll(1, &mut uart).is_none());
    assert_eq!(reader.stats().overruns, 1);

    uart.queue_tag(HENK);
    let packet = reader.poll(2, &mut uart).expect("reader recovers");
    assert_eq!(packet.hex_key.as_str(), HENK);
}

#[test]
fn missing_inverse_rejected_only_when_required() {
    let mut frame = encode_frame(HENK.as_bytes()).unwrap();
    let invert_at = frame.len() - 2;
    frame[invert_at] = 0x00;

    let (mut strict, _pin, mut uart) = reader(quiet_config());
    uart.queue_bytes(&frame);
    assert!(strict.poll(0, &mut uart).is_none());
    assert_eq!(strict.stats().checksum_failures, 1);

    let lax_cfg = ReaderConfig {
        invert_required: false,
        ..quiet_config()
    };
    let (mut lax, _pin, mut uart) = reader(lax_cfg);
    uart.queue_bytes(&frame);
    assert!(lax.poll(0, &mut uart).is_some());
}

#[test]
fn read_interval_throttles_uart_reads() {
    let cfg = ReaderConfig {
        reset_period_ms: 0,
        read_interval_ms: 333,
        ..ReaderConfig::default()
    };
    let (mut reader, _pin, mut uart) = reader(cfg);
    assert!(reader.poll(0, &mut uart).is_none());

    uart.queue_tag(HENK);
    assert!(reader.poll(100, &mut uart).is_none());
    assert_eq!(uart.rx.len(), 30, "throttled poll must not touch the UART");

    assert!(reader.poll(333, &mut uart).is_some());
}

#[test]
fn periodic_reset_pulses_line() {
    let cfg = ReaderConfig {
        reset_pulse_ms: 75,
        reset_settle_ms: 80,
        reset_period_ms: 333,
        read_interval_ms: 0,
        ..ReaderConfig::default()
    };
    let (mut reader, pin, mut uart) = reader(cfg);

    reader.poll(332, &mut uart);
    assert!(!pin.is_high());
    reader.poll(333, &mut uart);
    assert!(pin.is_high());
    reader.poll(407, &mut uart);
    assert!(pin.is_high());
    reader.poll(408, &mut uart);
    assert!(!pin.is_high());

    reader.poll(488, &mut uart);
    assert!(reader.reset_scheduler().is_idle());
    assert_eq!(reader.reset_scheduler().next_reset(), Some(666));
    assert_eq!(pin.levels(), vec![false, true, false]);
}

#[test]
fn reset_on_success_rearms_immediately() {
    let cfg = ReaderConfig {
        reset_on_success: true,
        ..quiet_config()
    };
    let (mut reader, pin, mut uart) = reader(cfg);
    uart.queue_tag(HENK);
    assert!(reader.poll(10, &mut uart).is_some());
    assert!(pin.is_high());
}

#[test]
fn forced_reset_clears_partial_frame() {
    let (mut reader, pin, mut uart) = reader(quiet_config());
    let frame = encode_frame(HENK.as_bytes()).unwrap();
    uart.queue_bytes(&frame[..10]);
    reader.poll(0, &mut uart);

    assert!(reader.force_reset(5));
    assert!(pin.is_high());
    assert!(!reader.force_reset(6), "cycle already running");

    // The tail alone is not a frame.
    uart.queue_bytes(&frame[10..]);
    assert!(reader.poll(7, &mut uart).is_none());
}

#[test]
fn active_tag_expires_after_timeout() {
    let (mut reader, _pin, mut uart) = reader(quiet_config());
    uart.queue_tag(HENK);
    reader.poll(100, &mut uart);
    assert!(reader.active_tag(1_099, 1_000).is_some());
    assert!(reader.active_tag(1_100, 1_000).is_none());
}
