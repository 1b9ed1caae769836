//! Per-subject lick and bout tracker.
//!
//! ```text
//!            rising edge (open bout if none)
//!   ┌──────┐ ─────────────────────────────▶ ┌─────────┐
//!   │ Idle │                                │ Contact │
//!   └──────┘ ◀───────────────────────────── └─────────┘
//!      │      falling edge (lick if duration in window)
//!      │
//!      └─ while idle with licks: gap >= max_bout_gap_ms → close bout
//! ```
//!
//! A bout accumulator may span many idle/contact cycles. It closes when
//! the sensor has been idle for `max_bout_gap_ms` since the last lick
//! ended, or when [`LickBoutTracker::end_bout`] forces it (subject switch,
//! shutdown). Closing yields a [`BoutSummary`] only if the bout reached
//! `min_licks_per_bout`; smaller clusters fizzle and are discarded.

use serde::Serialize;

use super::debounce::{Debouncer, Transition};
use crate::config::LickConfig;

/// A validated lick, emitted on the falling edge that ends it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LickEvent {
    pub duration_ms: u64,
    pub value: Option<f64>,
}

/// Immutable snapshot of a closed bout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoutSummary {
    pub start_time: u64,
    pub end_time: u64,
    pub duration_ms: u64,
    pub lick_count: u32,
    pub start_value: Option<f64>,
    pub end_value: Option<f64>,
    /// `end_value - start_value`, when both are known.
    pub value_delta: Option<f64>,
    /// Max minus min over the start value and every lick value.
    pub value_extent: Option<f64>,
    pub lick_durations: Vec<u64>,
}

/// Snapshot of a bout that is still open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoutProgress {
    pub start_time: u64,
    pub start_value: Option<f64>,
    pub licks_so_far: u32,
}

/// Licks collected since the bout opened.
#[derive(Debug, Clone, Default)]
struct BoutAccumulator {
    start_time: Option<u64>,
    start_value: Option<f64>,
    licks: Vec<LickEvent>,
}

impl BoutAccumulator {
    fn is_open(&self) -> bool {
        self.start_time.is_some()
    }

    fn open(&mut self, now_ms: u64, value: Option<f64>) {
        self.start_time = Some(now_ms);
        self.start_value = value;
        self.licks.clear();
    }

    fn push(&mut self, lick: LickEvent) {
        self.licks.push(lick);
    }

    fn clear(&mut self) {
        self.start_time = None;
        self.start_value = None;
        self.licks.clear();
    }

    fn summarize(&self, end_time: u64, end_value: Option<f64>) -> BoutSummary {
        let start_time = self.start_time.unwrap_or(end_time);
        let end_value = end_value.or_else(|| self.licks.last().and_then(|l| l.value));
        let value_delta = match (self.start_value, end_value) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        };

        let mut values = self
            .start_value
            .into_iter()
            .chain(self.licks.iter().filter_map(|l| l.value));
        let value_extent = values.next().map(|first| {
            let (lo, hi) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
            hi - lo
        });

        BoutSummary {
            start_time,
            end_time,
            duration_ms: end_time.saturating_sub(start_time),
            lick_count: self.licks.len() as u32,
            start_value: self.start_value,
            end_value,
            value_delta,
            value_extent,
            lick_durations: self.licks.iter().map(|l| l.duration_ms).collect(),
        }
    }
}

/// Outcome of one debounced sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub transition: Transition,
    pub lick: Option<LickEvent>,
    pub bout: Option<BoutSummary>,
}

impl SampleOutcome {
    pub fn lick_added(&self) -> bool {
        self.lick.is_some()
    }

    pub fn bout_closed(&self) -> bool {
        self.bout.is_some()
    }
}

/// Outcome of [`LickBoutTracker::end_bout`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForcedClose {
    /// Duration of the in-flight contact, if one was cut short.
    pub cut_contact_ms: Option<u64>,
    /// The cut contact qualified as a lick and was counted.
    pub lick_finalized: bool,
    pub bout: Option<BoutSummary>,
}

pub struct LickBoutTracker {
    params: LickConfig,
    debouncer: Debouncer,
    last_lick_end: Option<u64>,
    bout: BoutAccumulator,
    /// Valid licks in the open bout.
    lick_count: u32,
    /// Bouts closed since creation or the last counts reset.
    bout_count: u32,
    /// Valid licks over the tracker's lifetime.
    total_licks: u64,
    last_summary: Option<BoutSummary>,
}

impl LickBoutTracker {
    pub fn new(params: LickConfig, now_ms: u64) -> Self {
        Self {
            params,
            debouncer: Debouncer::new(params.debounce_ms, now_ms),
            last_lick_end: None,
            bout: BoutAccumulator::default(),
            lick_count: 0,
            bout_count: 0,
            total_licks: 0,
            last_summary: None,
        }
    }

    /// Feed one raw contact sample with the optional water-level reading.
    pub fn process_sample(&mut self, raw: bool, now_ms: u64, value: Option<f64>) -> SampleOutcome {
        let transition = self.debouncer.observe(raw, now_ms);
        let mut lick = None;
        let mut bout = None;

        if transition.is_falling() {
            self.last_lick_end = Some(now_ms);
            lick = self.try_count_lick(transition.duration_ms, value);
            if lick.is_none() && self.lick_count == 0 {
                // A bout with no valid lick is never closed by the gap
                // check, so it would otherwise date a much later bout.
                self.bout.clear();
            }
        }

        if transition.is_rising() && !self.bout.is_open() {
            self.bout.open(now_ms, value);
        }

        if !transition.current && self.lick_count > 0 {
            let gap = now_ms.saturating_sub(self.last_lick_end.unwrap_or(now_ms));
            if gap >= self.params.max_bout_gap_ms {
                bout = self.close_bout(now_ms, value);
            }
        }

        SampleOutcome {
            transition,
            lick,
            bout,
        }
    }

    /// Force the open bout closed at `now_ms`, applying the usual
    /// minimum-lick rule, then reset the debouncer to idle.
    ///
    /// With `finalize_current_lick`, a contact still in progress is ended
    /// at `now_ms` and counted if its duration qualifies.
    pub fn end_bout(
        &mut self,
        now_ms: u64,
        value: Option<f64>,
        finalize_current_lick: bool,
    ) -> ForcedClose {
        let mut cut_contact_ms = None;
        let mut lick_finalized = false;

        if finalize_current_lick && self.debouncer.state() {
            let duration = now_ms.saturating_sub(self.debouncer.stable_since());
            cut_contact_ms = Some(duration);
            self.last_lick_end = Some(now_ms);
            lick_finalized = self.try_count_lick(duration, value).is_some();
        }

        let bout = if self.lick_count > 0 {
            self.close_bout(now_ms, value)
        } else {
            self.bout.clear();
            None
        };

        self.debouncer.force_idle(now_ms);
        if self.last_lick_end.is_none() {
            self.last_lick_end = Some(now_ms);
        }

        ForcedClose {
            cut_contact_ms,
            lick_finalized,
            bout,
        }
    }

    /// Zero the per-bout and bout counters and discard the open bout.
    pub fn reset_counts(&mut self) {
        self.lick_count = 0;
        self.bout_count = 0;
        self.bout.clear();
    }

    pub fn lick_count(&self) -> u32 {
        self.lick_count
    }

    pub fn bout_count(&self) -> u32 {
        self.bout_count
    }

    pub fn total_licks(&self) -> u64 {
        self.total_licks
    }

    /// Debounced contact state.
    pub fn state(&self) -> bool {
        self.debouncer.state()
    }

    pub fn params(&self) -> &LickConfig {
        &self.params
    }

    pub fn last_summary(&self) -> Option<&BoutSummary> {
        self.last_summary.as_ref()
    }

    pub fn current_bout(&self) -> Option<BoutProgress> {
        self.bout.start_time.map(|start_time| BoutProgress {
            start_time,
            start_value: self.bout.start_value,
            licks_so_far: self.lick_count,
        })
    }

    // ── Internal ──────────────────────────────────────────────

    fn try_count_lick(&mut self, duration_ms: u64, value: Option<f64>) -> Option<LickEvent> {
        if !(self.params.min_lick_ms..=self.params.max_lick_ms).contains(&duration_ms) {
            return None;
        }
        let lick = LickEvent { duration_ms, value };
        if !self.bout.is_open() {
            let started = self
                .last_lick_end
                .unwrap_or(0)
                .saturating_sub(duration_ms);
            self.bout.open(started, value);
        }
        self.bout.push(lick);
        self.lick_count += 1;
        self.total_licks += 1;
        Some(lick)
    }

    fn close_bout(&mut self, now_ms: u64, value: Option<f64>) -> Option<BoutSummary> {
        let summary = if self.lick_count >= self.params.min_licks_per_bout {
            let summary = self.bout.summarize(now_ms, value);
            self.bout_count += 1;
            self.last_summary = Some(summary.clone());
            Some(summary)
        } else {
            None
        };
        self.bout.clear();
        self.lick_count = 0;
        summary
    }
}
