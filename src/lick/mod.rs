//! Lick and bout detection.
//!
//! ```text
//!  raw contact ──▶ Debouncer ──▶ LickBoutTracker ──▶ ProcessingResult
//!                                      ▲
//!                    SubjectRouter ────┘ (one tracker per subject)
//! ```
//!
//! Pure logic with caller-supplied timestamps; no I/O and no clock reads.

pub mod debounce;
pub mod router;
pub mod tracker;

pub use debounce::{Debouncer, Transition};
pub use router::{ProcessingResult, SubjectRouter, SubjectSwitch};
pub use tracker::{BoutProgress, BoutSummary, ForcedClose, LickBoutTracker, LickEvent, SampleOutcome};
