//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per
//! application event to the logger (UART / USB-CDC in production).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { subjects } => {
                info!("START | subjects={}", subjects);
            }
            AppEvent::TagRead { subject, packet } => {
                info!(
                    "TAG | key={} | subject={} | be=0x{:X} le=0x{:X} | t={}ms",
                    packet.hex_key, subject, packet.id_be, packet.id_le, packet.time_ms
                );
            }
            AppEvent::SubjectChanged { from, to, at_ms } => {
                info!("SUBJECT | {:<10} -> {:<10} | t={}ms", from, to, at_ms);
            }
            AppEvent::Processed(r) => {
                if r.lick_added {
                    info!(
                        "LICK | {} | dur={}ms | licks={} bouts={}",
                        r.subject_id, r.state_duration_ms, r.lick_count, r.bout_count
                    );
                } else {
                    info!(
                        "STATE | {} | {}->{} after {}ms | licks={} bouts={}",
                        r.subject_id,
                        u8::from(r.previous_state),
                        u8::from(r.current_state),
                        r.state_duration_ms,
                        r.lick_count,
                        r.bout_count
                    );
                }
            }
            AppEvent::BoutClosed {
                subject,
                bout_count,
                summary,
            } => {
                info!(
                    "BOUT | {} | #{} | licks={} | {}..{} ({}ms) | delta={} extent={}",
                    subject,
                    bout_count,
                    summary.lick_count,
                    summary.start_time,
                    summary.end_time,
                    summary.duration_ms,
                    fmt_value(summary.value_delta),
                    fmt_value(summary.value_extent),
                );
            }
            AppEvent::DispenseStarted { subject, bout_count } => {
                info!("FEED | on | {} after {} bouts", subject, bout_count);
            }
            AppEvent::DispenseFinished { subject } => {
                info!("FEED | off | {}", subject);
            }
            AppEvent::CountsReset { subject } => {
                info!("RESET | counts | {}", subject);
            }
            AppEvent::ConfigUpdated => {
                info!("CONFIG | updated");
            }
            AppEvent::Stopped => {
                info!("STOP");
            }
        }
    }
}

fn fmt_value(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
