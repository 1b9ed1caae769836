//! Timed feeder reward.
//!
//! A subject that completes `deployment.bout_count` bouts earns one
//! feeder pulse of `deployment.duration_ms`. The pulse is non-blocking:
//! [`Dispenser::start`] energises the relay and [`Dispenser::tick`]
//! reports when to release it.

use log::info;

use crate::config::DeploymentConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
enum DispenseState {
    Idle,
    Dispensing { subject: String, until: u64 },
}

pub struct Dispenser {
    cfg: DeploymentConfig,
    state: DispenseState,
    completed: u32,
}

impl Dispenser {
    pub fn new(cfg: DeploymentConfig) -> Self {
        Self {
            cfg,
            state: DispenseState::Idle,
            completed: 0,
        }
    }

    /// Whether `bout_count` bouts earn a reward. Always false when the
    /// feeder is disabled.
    pub fn is_due(&self, bout_count: u32) -> bool {
        self.cfg.bout_count > 0 && bout_count >= self.cfg.bout_count
    }

    /// Begin a dispense for `subject`. Returns `false` (and changes nothing)
    /// while another dispense is running.
    pub fn start(&mut self, subject: &str, now_ms: u64) -> bool {
        if self.is_active() {
            return false;
        }
        info!(
            "Deployment bout count {} reached for '{}', feeder on for {} ms",
            self.cfg.bout_count, subject, self.cfg.duration_ms
        );
        self.state = DispenseState::Dispensing {
            subject: subject.to_string(),
            until: now_ms + self.cfg.duration_ms,
        };
        true
    }

    /// Returns the finished subject when the pulse has elapsed.
    pub fn tick(&mut self, now_ms: u64) -> Option<String> {
        let due = matches!(self.state, DispenseState::Dispensing { until, .. } if now_ms >= until);
        if !due {
            return None;
        }
        let DispenseState::Dispensing { subject, .. } =
            core::mem::replace(&mut self.state, DispenseState::Idle)
        else {
            return None;
        };
        self.completed += 1;
        info!("Feeder off ('{}')", subject);
        Some(subject)
    }

    /// Abort any running dispense (shutdown path).
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = DispenseState::Idle;
        was_active
    }

    /// New settings apply to the next dispense.
    pub fn set_config(&mut self, cfg: DeploymentConfig) {
        self.cfg = cfg;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DispenseState::Dispensing { .. })
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }
}
