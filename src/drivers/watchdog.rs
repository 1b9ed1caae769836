//! Task watchdog (TWDT) for the monitoring loop.
//!
//! The loop must call [`LoopWatchdog::feed`] every iteration; a stall
//! longer than the timeout panics and reboots the board so the lick and
//! tag pipelines never silently freeze.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, esp_task_wdt_reset,
};
use log::{info, warn};

/// Default stall timeout.
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

pub struct LoopWatchdog {
    subscribed: bool,
    feeds: u64,
}

impl LoopWatchdog {
    /// Subscribe the calling task with a `timeout_ms` stall limit.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain IDF calls from the main task during startup.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK as i32 {
                warn!("Watchdog: reconfigure returned {} (may already be configured)", ret);
            }
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            let subscribed = ret == ESP_OK as i32;
            if subscribed {
                info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
            } else {
                warn!("Watchdog: failed to subscribe ({})", ret);
            }
            Self { subscribed, feeds: 0 }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): {} ms timeout not enforced", timeout_ms);
            Self {
                subscribed: false,
                feeds: 0,
            }
        }
    }

    pub fn feed(&mut self) {
        self.feeds += 1;
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the current task was added in new().
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.subscribed
    }

    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}

impl Drop for LoopWatchdog {
    fn drop(&mut self) {
        if self.subscribed {
            warn!("Watchdog: dropped while armed after {} feeds", self.feeds);
        }
    }
}
