//! GPIO / peripheral pin assignments for the HydraPurr board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Lick sensor and water level (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive lick electrode, read as an analog voltage.
/// ADC1 channel 1 (GPIO 2 on ESP32-S3).
pub const LICK_ADC_CHANNEL: u32 = 1;
/// Water-level float sensor, analog.
/// ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const WATER_LEVEL_ADC_CHANNEL: u32 = 0;

/// The electrode pulls the line low while a tongue touches it.
/// Readings below this count as contact.
pub const LICK_THRESHOLD_MV: u32 = 2000;

/// Full-scale input at 12 dB attenuation.
pub const ADC_FULL_SCALE_MV: u32 = 3100;

// ---------------------------------------------------------------------------
// Feeder relay
// ---------------------------------------------------------------------------

/// Digital output: HIGH energises the feeder relay.
pub const FEEDER_RELAY_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// RFID reader (WL-134, 9600 8N1, RX only)
// ---------------------------------------------------------------------------

pub const RFID_UART_NUM: i32 = 1;
pub const RFID_RX_GPIO: i32 = 9;
/// Digital output: HIGH holds the reader module in reset.
pub const RFID_RESET_GPIO: i32 = 11;
pub const RFID_BAUD: i32 = 9600;
/// Driver-side receive ring buffer.
pub const RFID_UART_RX_BUF: i32 = 256;
