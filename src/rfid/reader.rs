//! Tag reader: UART bytes in, deduplicated identity packets out.
//!
//! Composes [`FrameReader`], [`validate_frame`]/[`parse_body`],
//! [`Deduplicator`] and [`ResetScheduler`] around a non-blocking
//! [`ByteSource`] and the reader module's reset GPIO.
//!
//! The reset line is active-high: driving it high holds the module in
//! reset.

use embedded_hal::digital::OutputPin;
use log::{debug, warn};
use serde::Serialize;

use super::dedup::Deduplicator;
use super::frame::{FrameReader, MAX_FRAME_LEN_LIMIT};
use super::packet::{IdentityPacket, parse_body, validate_frame};
use super::reset::{ResetLine, ResetScheduler};
use crate::app::ports::ByteSource;
use crate::config::ReaderConfig;
use crate::error::FrameError;

/// Running counters, reset only on reboot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    pub frames: u32,
    pub accepted: u32,
    pub malformed: u32,
    pub checksum_failures: u32,
    pub overruns: u32,
    pub duplicates: u32,
    pub bytes_dropped: u32,
    pub reset_pin_errors: u32,
}

pub struct TagReader<P: OutputPin> {
    cfg: ReaderConfig,
    frames: FrameReader,
    dedup: Deduplicator,
    reset: ResetScheduler,
    reset_pin: P,
    last_attempt_ms: Option<u64>,
    last_success: Option<IdentityPacket>,
    stats: ReaderStats,
}

impl<P: OutputPin> TagReader<P> {
    /// Build a reader and release the reset line.
    pub fn new(cfg: &ReaderConfig, reset_pin: P, now_ms: u64) -> Self {
        let mut reader = Self {
            cfg: *cfg,
            frames: FrameReader::new(cfg.max_frame_len),
            dedup: Deduplicator::new(cfg.repeat_ms),
            reset: ResetScheduler::new(
                cfg.reset_pulse_ms,
                cfg.reset_settle_ms,
                cfg.reset_period_ms,
                now_ms,
            ),
            reset_pin,
            last_attempt_ms: None,
            last_success: None,
            stats: ReaderStats::default(),
        };
        reader.drive_reset(ResetLine::Release);
        debug!(
            "[RFID] init: max_len={} repeat={}ms reset period={}ms",
            reader.frames.max_frame_len(),
            cfg.repeat_ms,
            cfg.reset_period_ms
        );
        reader
    }

    /// One non-blocking poll. Ticks the reset scheduler every call; reads
    /// and decodes at most one frame per `read_interval_ms`.
    pub fn poll(&mut self, now_ms: u64, uart: &mut impl ByteSource) -> Option<IdentityPacket> {
        if let Some(line) = self.reset.tick(now_ms) {
            self.drive_reset(line);
        }

        if self.cfg.read_interval_ms > 0 {
            if let Some(last) = self.last_attempt_ms {
                if now_ms.saturating_sub(last) < self.cfg.read_interval_ms {
                    return None;
                }
            }
        }
        self.last_attempt_ms = Some(now_ms);

        self.fill_from(uart);

        let frame = match self.frames.try_extract_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                self.record_error(e);
                return None;
            }
        };
        self.stats.frames = self.stats.frames.saturating_add(1);

        let packet = match validate_frame(&frame, self.cfg.invert_required)
            .and_then(|body| parse_body(body, now_ms))
        {
            Ok(packet) => packet,
            Err(e) => {
                self.record_error(e);
                return None;
            }
        };

        if !self.dedup.accept(&packet.hex_key, now_ms) {
            debug!("[RFID] duplicate suppressed: {}", packet.hex_key);
            self.stats.duplicates = self.stats.duplicates.saturating_add(1);
            return None;
        }

        debug!("[RFID] tag: {}", packet.hex_key);
        self.stats.accepted = self.stats.accepted.saturating_add(1);
        self.last_success = Some(packet.clone());

        if self.cfg.reset_on_success {
            if let Some(line) = self.reset.rearm_now(now_ms) {
                self.drive_reset(line);
            }
        }
        Some(packet)
    }

    /// Last accepted packet if it is younger than `timeout_ms`.
    pub fn active_tag(&self, now_ms: u64, timeout_ms: u64) -> Option<&IdentityPacket> {
        self.last_success
            .as_ref()
            .filter(|p| now_ms.saturating_sub(p.time_ms) < timeout_ms)
    }

    /// Pulse the reset line now unless a cycle is already running.
    pub fn force_reset(&mut self, now_ms: u64) -> bool {
        match self.reset.force_reset_now(now_ms) {
            Some(line) => {
                self.frames.clear();
                self.drive_reset(line);
                true
            }
            None => false,
        }
    }

    /// Apply a new reader configuration. Buffered bytes are kept if the
    /// frame bound is unchanged.
    pub fn apply_config(&mut self, cfg: &ReaderConfig, now_ms: u64) {
        if cfg.max_frame_len != self.cfg.max_frame_len {
            self.frames = FrameReader::new(cfg.max_frame_len);
        }
        self.dedup.set_window(cfg.repeat_ms);
        if cfg.reset_pulse_ms != self.cfg.reset_pulse_ms
            || cfg.reset_settle_ms != self.cfg.reset_settle_ms
            || cfg.reset_period_ms != self.cfg.reset_period_ms
        {
            self.reset.reconfigure(
                cfg.reset_pulse_ms,
                cfg.reset_settle_ms,
                cfg.reset_period_ms,
                now_ms,
            );
        }
        self.cfg = *cfg;
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    pub fn reset_scheduler(&self) -> &ResetScheduler {
        &self.reset
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.cfg
    }

    // ── Internal ──────────────────────────────────────────────

    fn fill_from(&mut self, uart: &mut impl ByteSource) {
        let mut chunk = [0u8; MAX_FRAME_LEN_LIMIT];
        let want = self.frames.max_frame_len().min(chunk.len());
        let n = uart.read_available(&mut chunk[..want]).min(want);
        if n == 0 {
            return;
        }
        let dropped = self.frames.ingest(&chunk[..n]);
        if dropped > 0 {
            self.stats.bytes_dropped = self
                .stats
                .bytes_dropped
                .saturating_add(u32::try_from(dropped).unwrap_or(u32::MAX));
        }
    }

    fn record_error(&mut self, e: FrameError) {
        match e {
            FrameError::Malformed => {
                debug!("[RFID] {}", e);
                self.stats.malformed = self.stats.malformed.saturating_add(1);
            }
            FrameError::ChecksumMismatch { .. } | FrameError::InvertMismatch { .. } => {
                warn!("[RFID] {}", e);
                self.stats.checksum_failures = self.stats.checksum_failures.saturating_add(1);
            }
            // Already logged by the frame reader.
            FrameError::Overrun { dropped } => {
                self.stats.overruns = self.stats.overruns.saturating_add(1);
                self.stats.bytes_dropped = self
                    .stats
                    .bytes_dropped
                    .saturating_add(u32::try_from(dropped).unwrap_or(u32::MAX));
            }
        }
    }

    fn drive_reset(&mut self, line: ResetLine) {
        let res = match line {
            ResetLine::Assert => self.reset_pin.set_high(),
            ResetLine::Release => self.reset_pin.set_low(),
        };
        match res {
            Ok(()) => debug!("[RFID] reset: {:?}", line),
            Err(e) => {
                warn!("[RFID] reset pin {:?} failed: {:?}", line, e);
                self.stats.reset_pin_errors = self.stats.reset_pin_errors.saturating_add(1);
            }
        }
    }
}
