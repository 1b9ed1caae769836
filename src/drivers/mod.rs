//! Board-level drivers.

pub mod hw_init;
pub mod watchdog;
