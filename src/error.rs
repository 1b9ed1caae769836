//! Unified error types for the HydraPurr firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the main
//! loop's error handling stays uniform. Wire-level failures are `Copy` and
//! never fatal: the tag reader logs them and reports "no packet this cycle".

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An RFID frame could not be extracted, validated, or parsed.
    Frame(FrameError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// RFID wire errors
// ---------------------------------------------------------------------------

/// Failures on the reader's STX/ETX wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Missing markers, payload too short, or body not 26 hex characters.
    Malformed,
    /// XOR of the body does not match the checksum byte.
    ChecksumMismatch { computed: u8, received: u8 },
    /// `checksum ^ invert` is not `0xFF`.
    InvertMismatch { checksum: u8, invert: u8 },
    /// A start marker ran past `max_frame_len` without a terminator.
    /// `dropped` counts the bytes discarded while resyncing.
    Overrun { dropped: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed frame"),
            Self::ChecksumMismatch { computed, received } => write!(
                f,
                "checksum mismatch (computed=0x{computed:02X} received=0x{received:02X})"
            ),
            Self::InvertMismatch { checksum, invert } => write!(
                f,
                "checksum invert mismatch (checksum=0x{checksum:02X} invert=0x{invert:02X})"
            ),
            Self::Overrun { dropped } => write!(f, "frame overrun, {dropped} bytes dropped"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<crate::app::ports::ConfigError> for Error {
    fn from(e: crate::app::ports::ConfigError) -> Self {
        use crate::app::ports::ConfigError;
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("config not found"),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("config I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
