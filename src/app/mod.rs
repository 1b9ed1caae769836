//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the lick/bout detector, the RFID tag reader and the
//! feeder reward together. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
