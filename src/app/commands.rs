//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial
//! console, buttons, a config reload) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::SystemConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Zero a subject's lick and bout counters (`None` = active subject).
    ResetCounts { subject: Option<String> },

    /// Pulse the reader's reset line now unless a cycle is running.
    ForceReaderReset,

    /// Hot-reload configuration. Rejected if it fails validation.
    UpdateConfig(SystemConfig),

    /// Persist the current config on the next auto-save check.
    SaveConfig,

    /// Close the active bout and switch the feeder off.
    Shutdown,
}
