//! Multi-subject routing.
//!
//! One [`LickBoutTracker`] per subject, created on first reference with the
//! shared [`LickConfig`]. Exactly one subject is active; switching away
//! force-closes the outgoing subject's bout so no subject accumulates licks
//! while another animal is at the bowl.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;

use super::tracker::{BoutSummary, ForcedClose, LickBoutTracker};
use crate::config::LickConfig;
use crate::subjects::UNKNOWN_SUBJECT;

/// Per-sample record handed to the event sink / persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    pub subject_id: String,
    pub previous_state: bool,
    pub current_state: bool,
    pub state_duration_ms: u64,
    pub lick_added: bool,
    pub bout_closed: bool,
    /// Valid licks in the subject's open bout.
    pub lick_count: u32,
    pub bout_count: u32,
    /// Present only on the sample that closed a bout.
    pub bout_summary: Option<BoutSummary>,
}

impl ProcessingResult {
    /// Anything worth reporting happened on this sample.
    pub fn is_notable(&self) -> bool {
        self.previous_state != self.current_state || self.lick_added || self.bout_closed
    }
}

/// Outcome of a subject switch.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSwitch {
    pub from: String,
    pub to: String,
    pub closed: ForcedClose,
}

pub struct SubjectRouter {
    params: LickConfig,
    trackers: BTreeMap<String, LickBoutTracker>,
    active: String,
}

impl SubjectRouter {
    /// Build a router with `"unknown"` plus every name in `subjects`;
    /// `"unknown"` starts active.
    pub fn new<'a>(
        params: LickConfig,
        subjects: impl IntoIterator<Item = &'a str>,
        now_ms: u64,
    ) -> Self {
        let mut router = Self {
            params,
            trackers: BTreeMap::new(),
            active: UNKNOWN_SUBJECT.to_string(),
        };
        router.get_or_create(UNKNOWN_SUBJECT, now_ms);
        for name in subjects {
            router.get_or_create(name, now_ms);
        }
        router
    }

    /// Tracker for `subject_id`, provisioned on first use.
    pub fn get_or_create(&mut self, subject_id: &str, now_ms: u64) -> &mut LickBoutTracker {
        let params = self.params;
        self.trackers
            .entry(subject_id.to_string())
            .or_insert_with(|| {
                debug!("Router: provisioning tracker for '{}'", subject_id);
                LickBoutTracker::new(params, now_ms)
            })
    }

    /// Make `subject_id` active. No-op if it already is; otherwise the
    /// outgoing subject's bout is force-closed at `now_ms` first.
    pub fn set_active(&mut self, subject_id: &str, now_ms: u64) -> Option<SubjectSwitch> {
        if subject_id == self.active {
            return None;
        }

        let from = core::mem::replace(&mut self.active, subject_id.to_string());
        let closed = self
            .get_or_create(&from, now_ms)
            .end_bout(now_ms, None, true);
        self.get_or_create(subject_id, now_ms);

        info!(
            "Router: active subject '{}' -> '{}' (bout closed: {})",
            from,
            subject_id,
            closed.bout.is_some()
        );

        Some(SubjectSwitch {
            from,
            to: subject_id.to_string(),
            closed,
        })
    }

    /// Feed a raw contact sample to `subject_id`'s tracker.
    pub fn route_sample(
        &mut self,
        subject_id: &str,
        raw: bool,
        now_ms: u64,
        value: Option<f64>,
    ) -> ProcessingResult {
        let tracker = self.get_or_create(subject_id, now_ms);
        let outcome = tracker.process_sample(raw, now_ms, value);

        if let Some(summary) = &outcome.bout {
            info!(
                "Router: '{}' bout closed ({} licks, {} ms)",
                subject_id, summary.lick_count, summary.duration_ms
            );
        }

        ProcessingResult {
            subject_id: subject_id.to_string(),
            previous_state: outcome.transition.previous,
            current_state: outcome.transition.current,
            state_duration_ms: outcome.transition.duration_ms,
            lick_added: outcome.lick_added(),
            bout_closed: outcome.bout_closed(),
            lick_count: tracker.lick_count(),
            bout_count: tracker.bout_count(),
            bout_summary: outcome.bout,
        }
    }

    /// Feed a raw contact sample to the active subject.
    pub fn process_active(&mut self, raw: bool, now_ms: u64, value: Option<f64>) -> ProcessingResult {
        let active = self.active.clone();
        self.route_sample(&active, raw, now_ms, value)
    }

    /// Force-close the active subject's bout (shutdown path).
    pub fn end_active_bout(&mut self, now_ms: u64, value: Option<f64>) -> ForcedClose {
        let active = self.active.clone();
        self.get_or_create(&active, now_ms).end_bout(now_ms, value, true)
    }

    /// Zero counters for `subject_id`; unknown subjects are ignored.
    pub fn reset_counts(&mut self, subject_id: &str) {
        if let Some(tracker) = self.trackers.get_mut(subject_id) {
            tracker.reset_counts();
        }
    }

    /// Replace the parameter set used for trackers created from now on.
    pub fn set_params(&mut self, params: LickConfig) {
        self.params = params;
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn tracker(&self, subject_id: &str) -> Option<&LickBoutTracker> {
        self.trackers.get(subject_id)
    }

    pub fn lick_count(&self, subject_id: &str) -> u32 {
        self.tracker(subject_id).map_or(0, LickBoutTracker::lick_count)
    }

    pub fn bout_count(&self, subject_id: &str) -> u32 {
        self.tracker(subject_id).map_or(0, LickBoutTracker::bout_count)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.trackers.keys().map(String::as_str)
    }

    /// One-line status, e.g. `henk: state=0 licks=2 bouts=1`.
    pub fn state_string(&self, subject_id: &str) -> String {
        match self.tracker(subject_id) {
            Some(t) => format!(
                "{}: state={} licks={} bouts={}",
                subject_id,
                u8::from(t.state()),
                t.lick_count(),
                t.bout_count()
            ),
            None => format!("{subject_id}: untracked"),
        }
    }
}
