//! HydraPurr firmware library.
//!
//! Lick/bout detection, RFID subject identification and the feeder reward
//! loop, exposed for integration testing and simulation. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod dispense;
pub mod error;
pub mod lick;
pub mod pins;
pub mod rfid;
pub mod subjects;

// Hardware-facing modules compile on the host against inert stubs.
pub mod adapters;
pub mod drivers;

pub use error::{Error, FrameError, Result};
