//! Periodic reader reset pulse.
//!
//! ```text
//!   Idle ──(now ≥ next_reset)──▶ Asserting ──(pulse_ms)──▶ Settling ──(settle_ms)──▶ Idle
//!                                                                     next_reset += period
//! ```
//!
//! The scheduler owns no pin. [`ResetScheduler::tick`] returns the line
//! change to apply, and at most one phase change happens per tick.

use log::debug;

/// Requested change of the reset line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetLine {
    /// Hold the reader in reset.
    Assert,
    /// Let the reader run.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPhase {
    Idle,
    Asserting { until: u64 },
    /// `scheduled` is false for a cycle started by [`ResetScheduler::force_reset_now`],
    /// which must not shift the periodic cadence.
    Settling { until: u64, scheduled: bool },
}

#[derive(Debug, Clone)]
pub struct ResetScheduler {
    pulse_ms: u64,
    settle_ms: u64,
    period_ms: u64,
    phase: ResetPhase,
    scheduled: bool,
    next_reset: Option<u64>,
    completed: u64,
}

impl ResetScheduler {
    /// A `period_ms` of 0 disables periodic resets; forced resets still work.
    pub fn new(pulse_ms: u64, settle_ms: u64, period_ms: u64, now_ms: u64) -> Self {
        Self {
            pulse_ms,
            settle_ms,
            period_ms,
            phase: ResetPhase::Idle,
            scheduled: false,
            next_reset: (period_ms > 0).then(|| now_ms + period_ms),
            completed: 0,
        }
    }

    /// Advance the state machine.
    pub fn tick(&mut self, now_ms: u64) -> Option<ResetLine> {
        match self.phase {
            ResetPhase::Idle => {
                let due = self.next_reset.is_some_and(|t| now_ms >= t);
                if due {
                    self.scheduled = true;
                    return Some(self.assert(now_ms));
                }
                None
            }
            ResetPhase::Asserting { until } if now_ms >= until => {
                self.phase = ResetPhase::Settling {
                    until: now_ms + self.settle_ms,
                    scheduled: self.scheduled,
                };
                Some(ResetLine::Release)
            }
            ResetPhase::Settling { until, scheduled } if now_ms >= until => {
                self.phase = ResetPhase::Idle;
                self.completed += 1;
                if scheduled {
                    // Fixed cadence: advance from the planned time, not from now.
                    self.next_reset = if self.period_ms > 0 {
                        self.next_reset.map(|t| t + self.period_ms)
                    } else {
                        None
                    };
                }
                debug!(
                    "[RFID] reset cycle {} done, next at {:?}",
                    self.completed, self.next_reset
                );
                None
            }
            _ => None,
        }
    }

    /// Start a cycle immediately if idle. An in-flight cycle is never
    /// interrupted.
    pub fn force_reset_now(&mut self, now_ms: u64) -> Option<ResetLine> {
        if self.phase != ResetPhase::Idle {
            return None;
        }
        self.scheduled = false;
        Some(self.assert(now_ms))
    }

    /// Move the next scheduled reset to `now_ms`. Starts the cycle at once
    /// when idle; otherwise it begins as soon as the current one settles.
    pub fn rearm_now(&mut self, now_ms: u64) -> Option<ResetLine> {
        self.next_reset = Some(now_ms);
        self.tick(now_ms)
    }

    /// Apply new timings. The periodic schedule restarts from `now_ms`; a
    /// cycle in progress keeps its current deadline.
    pub fn reconfigure(&mut self, pulse_ms: u64, settle_ms: u64, period_ms: u64, now_ms: u64) {
        self.pulse_ms = pulse_ms;
        self.settle_ms = settle_ms;
        self.period_ms = period_ms;
        self.next_reset = (period_ms > 0).then(|| now_ms + period_ms);
    }

    pub fn phase(&self) -> ResetPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ResetPhase::Idle
    }

    /// Whether the reader is currently held in reset.
    pub fn is_asserted(&self) -> bool {
        matches!(self.phase, ResetPhase::Asserting { .. })
    }

    pub fn next_reset(&self) -> Option<u64> {
        self.next_reset
    }

    /// Cycles that made it all the way back to idle.
    pub fn completed_cycles(&self) -> u64 {
        self.completed
    }

    // ── Internal ──────────────────────────────────────────────

    fn assert(&mut self, now_ms: u64) -> ResetLine {
        self.phase = ResetPhase::Asserting {
            until: now_ms + self.pulse_ms,
        };
        ResetLine::Assert
    }
}
