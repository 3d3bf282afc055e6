//! Mock hardware adapters for integration tests.
//!
//! Records every pin write and every emitted event so tests can assert on
//! the full history without touching real GPIO.

use powerctl::app::events::AppEvent;
use powerctl::app::ports::{EventSink, PinPort};

// ── RecordingPin ──────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPin {
    pub writes: Vec<bool>,
}

#[allow(dead_code)]
impl RecordingPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current output level (low before the first write).
    pub fn is_high(&self) -> bool {
        self.writes.last().copied().unwrap_or(false)
    }

    pub fn rising_edges(&self) -> usize {
        let mut prev = false;
        self.writes
            .iter()
            .filter(|&&w| {
                let rising = w && !prev;
                prev = w;
                rising
            })
            .count()
    }
}

impl PinPort for RecordingPin {
    fn set(&mut self, high: bool) {
        self.writes.push(high);
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

    /// Events other than periodic telemetry.
    pub fn transitions(&self) -> Vec<AppEvent> {
        self.events
            .iter()
            .filter(|e| !matches!(e, AppEvent::Telemetry(_)))
            .cloned()
            .collect()
    }

    pub fn telemetry_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Telemetry(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
