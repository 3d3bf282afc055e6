//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | requested={} applied={} | on={}/{} | output={} | \
                     standby={} | periods={} edges={}",
                    t.requested,
                    t.applied,
                    t.on_count,
                    t.resolution,
                    if t.output_on { "ON" } else { "OFF" },
                    t.standby,
                    t.periods,
                    t.edges,
                );
            }
            AppEvent::LevelApplied { level, on_count } => {
                info!("LEVEL | {} -> {} on-ticks", level, on_count);
            }
            AppEvent::StandbyEntered(level) => {
                info!("STANDBY | entered at {}", level);
            }
            AppEvent::StandbyExited => {
                info!("STANDBY | exited");
            }
            AppEvent::ShutDown(reason) => {
                error!("SHUTDOWN | reason={:?}", reason);
            }
            AppEvent::Started(level) => {
                info!("START | initial_level={}", level);
            }
        }
    }
}
