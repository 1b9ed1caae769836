//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the subject router, the tag reader, the subject
//! registry and the feeder dispenser. It exposes a clean,
//! hardware-agnostic API. All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  ContactSensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  ByteSource ─────────▶ │        AppService        │
//!                        │ TagReader · SubjectRouter │
//!  FeederPort ◀───────── │   Registry · Dispenser    │
//!                        └──────────────────────────┘
//! ```

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::dispense::Dispenser;
use crate::error::Error;
use crate::lick::SubjectRouter;
use crate::rfid::{ReaderStats, TagReader};
use crate::subjects::SubjectRegistry;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ByteSource, ConfigPort, ContactSensorPort, EventSink, FeederPort};

/// Quiet time after the last config change before it is auto-saved.
const AUTO_SAVE_DELAY_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
///
/// `P` is the reader module's reset pin.
pub struct AppService<P: OutputPin> {
    config: SystemConfig,
    registry: SubjectRegistry,
    router: SubjectRouter,
    reader: TagReader<P>,
    dispenser: Dispenser,
    /// Timestamp of the latest unsaved config change.
    dirty_since_ms: Option<u64>,
    save_requested: bool,
}

impl<P: OutputPin> AppService<P> {
    /// Construct the service from a validated configuration.
    pub fn new(config: SystemConfig, reset_pin: P, now_ms: u64) -> Result<Self, Error> {
        config.validate()?;

        let registry = SubjectRegistry::from_entries(&config.subjects);
        let router = SubjectRouter::new(config.lick, registry.names(), now_ms);
        let reader = TagReader::new(&config.reader, reset_pin, now_ms);
        let dispenser = Dispenser::new(config.deployment);

        Ok(Self {
            config,
            registry,
            router,
            reader,
            dispenser,
            dirty_since_ms: None,
            save_requested: false,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce startup and make sure the feeder is off.
    pub fn start(&mut self, hw: &mut impl FeederPort, sink: &mut impl EventSink) {
        hw.set_feeder(false);
        sink.emit(&AppEvent::Started {
            subjects: self.registry.len(),
        });
        info!(
            "AppService started: {} subjects, active '{}'",
            self.registry.len(),
            self.router.active()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one iteration: tag reader → subject selection → contact
    /// sample → feeder.
    ///
    /// `hw` provides every board port at once, which avoids juggling
    /// several mutable borrows of the same peripheral bundle.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl ContactSensorPort + ByteSource + FeederPort),
        sink: &mut impl EventSink,
    ) {

        // 1. Tag reader (reset scheduler, rate-limited read, decode, dedup)
        if let Some(packet) = self.reader.poll(now_ms, hw) {
            let subject = self.registry.name_for(Some(packet.hex_key.as_str())).to_string();
            sink.emit(&AppEvent::TagRead { subject, packet });
        }

        // 2. Sticky identity → active subject
        let tag = self
            .reader
            .active_tag(now_ms, self.config.reader.active_timeout_ms)
            .map(|p| p.hex_key.as_str());
        let subject = self.registry.name_for(tag);
        if subject != self.router.active() {
            let subject = subject.to_string();
            self.switch_subject(&subject, now_ms, sink);
        }

        // 3. Contact sample for the active subject
        let raw = hw.read_contact();
        let value = hw.read_water_level();
        let result = self.router.process_active(raw, now_ms, value);
        let closed = result
            .bout_summary
            .clone()
            .map(|summary| AppEvent::BoutClosed {
                subject: result.subject_id.clone(),
                bout_count: result.bout_count,
                summary,
            });
        if result.is_notable() {
            sink.emit(&AppEvent::Processed(result));
        }
        if let Some(event) = closed {
            sink.emit(&event);
        }

        // 4. Feeder reward
        self.check_deployment(now_ms, hw, sink);
        if let Some(subject) = self.dispenser.tick(now_ms) {
            hw.set_feeder(false);
            sink.emit(&AppEvent::DispenseFinished { subject });
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command. Only `UpdateConfig` can fail, and a
    /// rejected config leaves the running one untouched.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut impl FeederPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match cmd {
            AppCommand::ResetCounts { subject } => {
                let subject = subject.unwrap_or_else(|| self.router.active().to_string());
                self.router.reset_counts(&subject);
                info!("Counts reset for '{}'", subject);
                sink.emit(&AppEvent::CountsReset { subject });
            }
            AppCommand::ForceReaderReset => {
                if !self.reader.force_reset(now_ms) {
                    info!("Reader reset already in progress");
                }
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                self.apply_config(new_config, now_ms);
                self.mark_config_dirty(now_ms);
                sink.emit(&AppEvent::ConfigUpdated);
                info!("Configuration updated at runtime");
            }
            AppCommand::SaveConfig => {
                self.mark_config_dirty(now_ms);
                self.save_requested = true;
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
            AppCommand::Shutdown => {
                let active = self.router.active().to_string();
                let closed = self.router.end_active_bout(now_ms, None);
                if let Some(summary) = closed.bout {
                    sink.emit(&AppEvent::BoutClosed {
                        bout_count: self.router.bout_count(&active),
                        subject: active,
                        summary,
                    });
                }
                if self.dispenser.cancel() {
                    info!("Dispense cancelled by shutdown");
                }
                hw.set_feeder(false);
                sink.emit(&AppEvent::Stopped);
                info!("AppService stopped");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn active_subject(&self) -> &str {
        self.router.active()
    }

    pub fn router(&self) -> &SubjectRouter {
        &self.router
    }

    pub fn registry(&self) -> &SubjectRegistry {
        &self.registry
    }

    pub fn reader_stats(&self) -> ReaderStats {
        self.reader.stats()
    }

    pub fn is_dispensing(&self) -> bool {
        self.dispenser.is_active()
    }

    /// Clone of the live configuration (for read-back or delta updates).
    pub fn current_config(&self) -> SystemConfig {
        self.config.clone()
    }

    // ── Internal ──────────────────────────────────────────────

    fn switch_subject(&mut self, subject: &str, now_ms: u64, sink: &mut impl EventSink) {
        let Some(switch) = self.router.set_active(subject, now_ms) else {
            return;
        };
        info!("Subject switched '{}' -> '{}'", switch.from, switch.to);
        sink.emit(&AppEvent::SubjectChanged {
            from: switch.from.clone(),
            to: switch.to,
            at_ms: now_ms,
        });
        if let Some(summary) = switch.closed.bout {
            sink.emit(&AppEvent::BoutClosed {
                bout_count: self.router.bout_count(&switch.from),
                subject: switch.from,
                summary,
            });
        }
    }

    fn check_deployment(&mut self, now_ms: u64, hw: &mut impl FeederPort, sink: &mut impl EventSink) {
        if self.dispenser.is_active() {
            return;
        }
        let active = self.router.active().to_string();
        let bout_count = self.router.bout_count(&active);
        if !self.dispenser.is_due(bout_count) || !self.dispenser.start(&active, now_ms) {
            return;
        }
        hw.set_feeder(true);
        sink.emit(&AppEvent::DispenseStarted {
            subject: active.clone(),
            bout_count,
        });
        self.router.reset_counts(&active);
        sink.emit(&AppEvent::CountsReset { subject: active });
    }

    fn apply_config(&mut self, config: SystemConfig, now_ms: u64) {
        self.registry = SubjectRegistry::from_entries(&config.subjects);
        self.router.set_params(config.lick);
        for name in self.registry.names() {
            self.router.get_or_create(name, now_ms);
        }
        self.reader.apply_config(&config.reader, now_ms);
        self.dispenser.set_config(config.deployment);
        self.config = config;
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified. Called by `handle_command(UpdateConfig)`.
    /// Each change restarts the quiet period.
    pub fn mark_config_dirty(&mut self, now_ms: u64) {
        self.dirty_since_ms = Some(now_ms);
    }

    /// Save once the config has been quiet for [`AUTO_SAVE_DELAY_MS`].
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &mut impl ConfigPort) -> bool {
        let Some(since) = self.dirty_since_ms else {
            return false;
        };
        if !self.save_requested && now_ms.saturating_sub(since) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.dirty_since_ms = None;
                self.save_requested = false;
                info!("Config auto-saved");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.dirty_since_ms.is_some()
    }
}
