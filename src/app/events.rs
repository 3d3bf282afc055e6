//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::level::PowerLevel;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial level).
    Started(PowerLevel),

    /// A period began with a different on/off split than the previous one.
    LevelApplied { level: PowerLevel, on_count: u16 },

    /// Setpoint went quiet; the level was lowered to the standby level.
    StandbyEntered(PowerLevel),

    /// A fresh external setpoint ended standby.
    StandbyExited,

    /// Output forced off; the controller no longer schedules.
    ShutDown(ShutdownReason),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Maximum run time elapsed.
    RunLimit,
    /// A `shutdown` command arrived.
    Requested,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryData {
    /// Level currently in the store.
    pub requested: PowerLevel,
    /// Level captured for the in-progress period.
    pub applied: PowerLevel,
    pub on_count: u16,
    pub resolution: u16,
    /// Last value written to the relay output.
    pub output_on: bool,
    pub standby: bool,
    pub periods: u64,
    pub edges: u64,
}
