//! System configuration parameters
//!
//! All tunable parameters for the HydraPurr monitor. Values can be
//! overridden from stored config blobs (see [`crate::adapters::storage`]).
//! Every algorithm receives its parameters from here; nothing downstream
//! bakes in its own defaults.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::rfid::frame::MAX_FRAME_LEN_LIMIT;
use crate::rfid::packet::TAG_HEX_LEN;
use crate::subjects::UNKNOWN_SUBJECT;

/// Lick and bout detection parameters, shared by every subject's tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LickConfig {
    /// Time a raw contact value must persist before it is accepted.
    pub debounce_ms: u64,
    /// Shortest contact that counts as a lick (inclusive).
    pub min_lick_ms: u64,
    /// Longest contact that counts as a lick (inclusive).
    pub max_lick_ms: u64,
    /// Licks required for a cluster to be reported as a bout.
    pub min_licks_per_bout: u32,
    /// Silence after the last lick that closes a bout (inclusive).
    pub max_bout_gap_ms: u64,
}

impl Default for LickConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 5,
            min_lick_ms: 50,
            max_lick_ms: 150,
            min_licks_per_bout: 3,
            max_bout_gap_ms: 1000,
        }
    }
}

/// RFID reader framing, de-duplication, and reset-line timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Window during which a repeated identical tag is suppressed.
    pub repeat_ms: u64,
    /// Longest STX..ETX frame accepted, markers included.
    pub max_frame_len: usize,
    /// Require `checksum ^ invert == 0xFF`.
    pub invert_required: bool,
    /// How long the reset line is held asserted.
    pub reset_pulse_ms: u64,
    /// Settling time after release before the next cycle may start.
    pub reset_settle_ms: u64,
    /// Fixed cadence of periodic resets (0 disables them).
    pub reset_period_ms: u64,
    /// Re-arm the reset pulse right after an accepted read.
    pub reset_on_success: bool,
    /// Minimum spacing between UART read attempts (0 = every poll).
    pub read_interval_ms: u64,
    /// How long a tag stays the active subject after its last good read.
    pub active_timeout_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            repeat_ms: 100,
            max_frame_len: 64,
            invert_required: true,
            reset_pulse_ms: 75,
            reset_settle_ms: 80,
            reset_period_ms: 333, // ~3 Hz
            reset_on_success: false,
            read_interval_ms: 333, // ~3 Hz
            active_timeout_ms: 1000,
        }
    }
}

/// Feeder reward after a subject completes enough bouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Bouts that trigger a dispense (0 disables the feeder).
    pub bout_count: u32,
    /// How long the feeder relay stays energised.
    pub duration_ms: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            bout_count: 5,
            duration_ms: 2000,
        }
    }
}

/// One known animal: the reader's hex key and a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub tag_key: String,
    pub name: String,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub lick: LickConfig,
    pub reader: ReaderConfig,
    pub deployment: DeploymentConfig,
    /// Main loop period (milliseconds).
    pub poll_interval_ms: u32,
    /// Registered subjects; any other tag maps to `"unknown"`.
    pub subjects: Vec<SubjectEntry>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            lick: LickConfig::default(),
            reader: ReaderConfig::default(),
            deployment: DeploymentConfig::default(),
            poll_interval_ms: 10, // 100 Hz
            subjects: vec![
                SubjectEntry {
                    tag_key: "61000000007E30010000000000".into(),
                    name: "henk".into(),
                },
                SubjectEntry {
                    tag_key: "32E09C0000ED30010000000000".into(),
                    name: "bob".into(),
                },
            ],
        }
    }
}

impl SystemConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lick = &self.lick;
        if lick.min_lick_ms > lick.max_lick_ms {
            return Err(ConfigError::ValidationFailed(
                "min_lick_ms must not exceed max_lick_ms",
            ));
        }
        if lick.min_licks_per_bout == 0 {
            return Err(ConfigError::ValidationFailed(
                "min_licks_per_bout must be at least 1",
            ));
        }

        let reader = &self.reader;
        if !(4..=MAX_FRAME_LEN_LIMIT).contains(&reader.max_frame_len) {
            return Err(ConfigError::ValidationFailed(
                "max_frame_len must be 4–128",
            ));
        }
        if reader.reset_period_ms > 0 && reader.reset_pulse_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "reset_pulse_ms must be non-zero when periodic reset is enabled",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be non-zero",
            ));
        }

        for subject in &self.subjects {
            let key_ok = subject.tag_key.len() == TAG_HEX_LEN
                && subject.tag_key.bytes().all(|b| b.is_ascii_hexdigit());
            if !key_ok {
                return Err(ConfigError::ValidationFailed(
                    "subject tag_key must be 26 hex characters",
                ));
            }
            if subject.name.is_empty() || subject.name == UNKNOWN_SUBJECT {
                return Err(ConfigError::ValidationFailed(
                    "subject name must be non-empty and not \"unknown\"",
                ));
            }
        }
        Ok(())
    }
}
