//! JSON-lines event sink.
//!
//! Writes each [`AppEvent`] as one JSON object per line to any
//! [`std::io::Write`] (a log file on the SD card, stdout in simulation).
//! Write failures are counted and logged, never propagated into the
//! monitoring loop.

use std::io::Write;

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct JsonLinesSink<W: Write> {
    out: W,
    written: u32,
    failures: u32,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            failures: 0,
        }
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &AppEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("JsonLinesSink: serialize failed: {}", e);
                self.failures += 1;
                return;
            }
        };
        let res = self
            .out
            .write_all(line.as_bytes())
            .and_then(|()| self.out.write_all(b"\n"));
        match res {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!("JsonLinesSink: write failed: {}", e);
                self.failures += 1;
            }
        }
    }
}
