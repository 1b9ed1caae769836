//! RFID tag reader pipeline.
//!
//! ```text
//!  UART bytes ──▶ FrameReader ──▶ validate_frame ──▶ parse_body ──▶ Deduplicator ──▶ IdentityPacket
//!                                                                         │
//!  ResetScheduler (ticked every poll) ──▶ reset GPIO                      ▼
//!                                                               TagReader::active_tag
//! ```

pub mod dedup;
pub mod frame;
pub mod packet;
pub mod reader;
pub mod reset;

pub use dedup::Deduplicator;
pub use frame::{ETX, Frame, FrameReader, STX};
pub use packet::{IdentityPacket, TagKey, encode_frame, parse_body, validate_frame};
pub use reader::{ReaderStats, TagReader};
pub use reset::{ResetLine, ResetPhase, ResetScheduler};
