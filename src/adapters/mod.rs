//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                     |
//! |-------------|---------------------|---------------------------------|
//! | `hardware`  | ContactSensorPort   | ESP32 ADC (lick, water level)   |
//! |             | ByteSource          | RFID UART                       |
//! |             | FeederPort          | Feeder relay GPIO               |
//! |             | OutputPin           | RFID reset GPIO                 |
//! | `log_sink`  | EventSink           | Serial log output               |
//! | `json_sink` | EventSink           | Any `std::io::Write`            |
//! | `storage`   | StoragePort         | NVS / in-memory store           |
//! |             | ConfigPort          | postcard blob over StoragePort  |
//! | `time`      | (clock)             | ESP32 system timer              |

pub mod hardware;
pub mod json_sink;
pub mod log_sink;
pub mod storage;
pub mod time;
