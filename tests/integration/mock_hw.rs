//! Mock board for integration tests.
//!
//! Scripts the lick contact, water level and RFID UART bytes, and records
//! every feeder and reset-line call so tests can assert on the full
//! history without touching real GPIO/ADC/UART registers.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use hydrapurr::app::events::AppEvent;
use hydrapurr::app::ports::{
    ByteSource, ContactSensorPort, EventSink, FeederPort, StorageError, StoragePort,
};
use hydrapurr::rfid::encode_frame;

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub contact: bool,
    pub water_level: Option<f64>,
    pub rx: VecDeque<u8>,
    pub feeder_calls: Vec<bool>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            contact: false,
            water_level: None,
            rx: VecDeque::new(),
            feeder_calls: Vec::new(),
        }
    }

    /// Queue one well-formed frame carrying `body`.
    pub fn queue_tag(&mut self, body: &str) {
        let frame = encode_frame(body.as_bytes()).expect("tag body fits in a frame");
        self.rx.extend(frame.iter().copied());
    }

    pub fn queue_bytes(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn feeder_on(&self) -> bool {
        self.feeder_calls.last().copied().unwrap_or(false)
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactSensorPort for MockBoard {
    fn read_contact(&mut self) -> bool {
        self.contact
    }

    fn read_water_level(&mut self) -> Option<f64> {
        self.water_level
    }
}

impl ByteSource for MockBoard {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

impl FeederPort for MockBoard {
    fn set_feeder(&mut self, on: bool) {
        self.feeder_calls.push(on);
    }
}

// ── MockPin ───────────────────────────────────────────────────

/// Reset-line pin that records levels (`true` = high). Clones share the
/// same history, so a test can keep a handle after moving the pin into a
/// reader.
#[derive(Clone, Default)]
pub struct MockPin {
    levels: Rc<RefCell<Vec<bool>>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn levels(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }

    pub fn is_high(&self) -> bool {
        self.levels.borrow().last().copied().unwrap_or(false)
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

// ── MockStorage ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockStorage {
    store: HashMap<String, Vec<u8>>,
    pub writes: u32,
}

impl StoragePort for MockStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self
            .store
            .get(&format!("{}::{}", namespace, key))
            .ok_or(StorageError::NotFound)?;
        if v.len() > buf.len() {
            return Err(StorageError::Full);
        }
        buf[..v.len()].copy_from_slice(v);
        Ok(v.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.writes += 1;
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
