//! Time-window debouncer for the lick contact input.
//!
//! A raw value becomes the *candidate*; the candidate is committed as the
//! stable state only after it has persisted for `window_ms` without
//! interruption. Any flip back resets the candidate timer, so bursts of
//! noise shorter than the window never reach the stable output.
//!
//! Time is supplied by the caller; the debouncer never reads a clock.

/// Result of feeding one raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Stable state before this sample.
    pub previous: bool,
    /// Stable state after this sample.
    pub current: bool,
    /// Time spent in `previous`, measured before any commit.
    pub duration_ms: u64,
}

impl Transition {
    /// Stable state went 0 -> 1.
    pub fn is_rising(&self) -> bool {
        !self.previous && self.current
    }

    /// Stable state went 1 -> 0.
    pub fn is_falling(&self) -> bool {
        self.previous && !self.current
    }

    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    stable: bool,
    stable_since: u64,
    candidate: bool,
    candidate_since: Option<u64>,
}

impl Debouncer {
    /// Start released (no contact) at `now_ms`.
    pub fn new(window_ms: u64, now_ms: u64) -> Self {
        Self {
            window_ms,
            stable: false,
            stable_since: now_ms,
            candidate: false,
            candidate_since: None,
        }
    }

    /// Feed one raw sample.
    ///
    /// A window of 0 commits every new candidate on the sample that
    /// introduces it.
    pub fn observe(&mut self, raw: bool, now_ms: u64) -> Transition {
        let previous = self.stable;
        let duration_ms = now_ms.saturating_sub(self.stable_since);

        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since = Some(now_ms);
        }

        if self.candidate != self.stable {
            let since = self.candidate_since.unwrap_or(now_ms);
            if now_ms.saturating_sub(since) >= self.window_ms {
                self.stable = self.candidate;
                self.stable_since = now_ms;
            }
        }

        Transition {
            previous,
            current: self.stable,
            duration_ms,
        }
    }

    /// Hard reset to released at `now_ms`, discarding any candidate.
    pub fn force_idle(&mut self, now_ms: u64) {
        self.stable = false;
        self.candidate = false;
        self.stable_since = now_ms;
        self.candidate_since = None;
    }

    /// Current stable (debounced) state.
    pub fn state(&self) -> bool {
        self.stable
    }

    /// When the current stable state was entered.
    pub fn stable_since(&self) -> u64 {
        self.stable_since
    }
}
