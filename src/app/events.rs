//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log to serial, append JSON lines to
//! the SD card, etc.

use serde::Serialize;

use crate::lick::{BoutSummary, ProcessingResult};
use crate::rfid::IdentityPacket;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// The service has started with this many registered subjects.
    Started { subjects: usize },

    /// A new (non-duplicate) tag was decoded.
    TagRead { subject: String, packet: IdentityPacket },

    /// The active subject changed.
    SubjectChanged { from: String, to: String, at_ms: u64 },

    /// A contact sample changed state, added a lick, or closed a bout.
    Processed(ProcessingResult),

    /// A bout met the minimum lick count and was finalized.
    BoutClosed {
        subject: String,
        bout_count: u32,
        summary: BoutSummary,
    },

    /// The feeder relay was energised for `subject`.
    DispenseStarted { subject: String, bout_count: u32 },

    /// The feeder pulse for `subject` ended.
    DispenseFinished { subject: String },

    /// A subject's lick and bout counters were zeroed.
    CountsReset { subject: String },

    /// A validated configuration replaced the running one.
    ConfigUpdated,

    /// The service stopped; the feeder is off and open bouts are closed.
    Stopped,
}
