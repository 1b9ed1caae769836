//! HydraPurr Firmware: Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  BoardAdapter            LogEventSink    StoredConfig    │
//! │  (Contact+UART+Feeder)   (EventSink)     (Config+NVS)    │
//! │  GpioPin (reset line)    MonotonicClock                  │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │              AppService (pure logic)               │  │
//! │  │  TagReader · SubjectRouter · Registry · Dispenser  │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use hydrapurr::adapters::hardware::{BoardAdapter, GpioPin};
use hydrapurr::adapters::log_sink::LogEventSink;
use hydrapurr::adapters::storage::{NvsStorage, StoredConfig};
use hydrapurr::adapters::time::MonotonicClock;
use hydrapurr::app::ports::ConfigPort;
use hydrapurr::app::service::AppService;
use hydrapurr::config::SystemConfig;
use hydrapurr::drivers::hw_init;
use hydrapurr::drivers::watchdog::{LoopWatchdog, WATCHDOG_TIMEOUT_MS};
use hydrapurr::pins;

/// How often reader statistics are logged.
const STATS_INTERVAL_MS: u64 = 60_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HydraPurr v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without the ADC or UART nothing can be measured; the task
        // watchdog reboots the board.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let storage = match NvsStorage::new() {
        Ok(s) => s,
        Err(e) => {
            warn!("NVS init failed ({}), config will not persist this session", e);
            NvsStorage::default()
        }
    };
    let mut config_store = StoredConfig::new(storage);
    let config = match config_store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Stored config unusable ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 4. Adapters + app service ─────────────────────────────
    let clock = MonotonicClock::new();
    let mut board = BoardAdapter::default();
    let mut log_sink = LogEventSink::new();
    let reset_pin = GpioPin::new(pins::RFID_RESET_GPIO);

    let poll_interval = Duration::from_millis(u64::from(config.poll_interval_ms));
    let mut app = AppService::new(config, reset_pin, clock.now_ms())?;
    app.start(&mut board, &mut log_sink);

    let mut watchdog = LoopWatchdog::new(WATCHDOG_TIMEOUT_MS);
    let mut last_stats_ms = clock.now_ms();

    info!("System ready. Entering monitor loop ({:?} period).", poll_interval);

    // ── 5. Monitor loop ───────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();
        app.tick(now_ms, &mut board, &mut log_sink);
        app.auto_save_if_needed(now_ms, &mut config_store);

        if now_ms.saturating_sub(last_stats_ms) >= STATS_INTERVAL_MS {
            last_stats_ms = now_ms;
            let s = app.reader_stats();
            info!(
                "RFID | frames={} ok={} dup={} bad_csum={} malformed={} overrun={} dropped={}B",
                s.frames,
                s.accepted,
                s.duplicates,
                s.checksum_failures,
                s.malformed,
                s.overruns,
                s.bytes_dropped
            );
            info!("{}", app.router().state_string(app.active_subject()));
        }

        watchdog.feed();
        std::thread::sleep(poll_interval);
    }
}
