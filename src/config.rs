//! System configuration parameters
//!
//! All tunable parameters for the power controller.  Supplied once at
//! construction and immutable while the controller runs.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::level::PowerLevel;
use crate::scheduler::SchedulerConfig;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Duty cycle ---
    /// Length of one on/off cycle (milliseconds)
    pub period_ms: u32,
    /// Sub-intervals per period
    pub resolution: u16,
    /// Level at boot (0-100%)
    pub initial_level_percent: u8,

    // --- Standby ---
    /// Setpoint silence before falling back to standby (seconds, 0 = off)
    pub standby_timeout_secs: u32,
    /// Level used while in standby (0-100%)
    pub standby_level_percent: u8,

    // --- Run limit ---
    /// Run time before automatic shutdown (seconds, 0 = never)
    pub shutdown_after_secs: u32,

    // --- Temperature loop ---
    pub pid_kp: f32,
    pub pid_ki: f32,
    pub pid_kd: f32,
    /// Initial temperature set-point
    pub pid_set_point: f32,

    // --- Comms ---
    /// UDP port for JSON-RPC setpoint datagrams
    pub command_udp_port: u16,
    /// TCP port for the HTTP setpoint form (0 = off)
    pub web_port: u16,

    // --- Housekeeping ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// Telemetry report interval (seconds, 0 = off)
    pub telemetry_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Duty cycle
            period_ms: 5_000,
            resolution: 10, // 500 ms ticks
            initial_level_percent: 0,

            // Standby
            standby_timeout_secs: 60,
            standby_level_percent: 20,

            // Run limit
            shutdown_after_secs: 24 * 3600,

            // PID
            pid_kp: 0.2,
            pid_ki: 0.0,
            pid_kd: 0.0,
            pid_set_point: 0.0,

            // Comms
            command_udp_port: 5010,
            web_port: 5010,

            // Housekeeping
            watchdog_timeout_ms: 10_000,
            telemetry_interval_secs: 60,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document; absent fields take their default.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON config"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Levels are clamped elsewhere, so only the
    /// timing fields can make the controller unrunnable.
    pub fn validate(&self) -> Result<()> {
        self.scheduler_config().validate()?;
        if self.sub_interval() < Duration::from_millis(1) {
            return Err(Error::Config("sub-interval must be at least 1 ms"));
        }
        if self.watchdog_timeout_ms == 0 {
            return Err(Error::Config("watchdog_timeout_ms must be non-zero"));
        }
        if u128::from(self.watchdog_timeout_ms) <= self.sub_interval().as_millis() {
            return Err(Error::Config("watchdog_timeout_ms must exceed one sub-interval"));
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            period: Duration::from_millis(u64::from(self.period_ms)),
            resolution: self.resolution,
            initial_level: self.initial_level(),
        }
    }

    pub fn initial_level(&self) -> PowerLevel {
        PowerLevel::new(self.initial_level_percent)
    }

    pub fn standby_level(&self) -> PowerLevel {
        PowerLevel::new(self.standby_level_percent)
    }

    /// Duration of one scheduler tick.
    pub fn sub_interval(&self) -> Duration {
        self.scheduler_config().sub_interval()
    }

    /// Convert a duration in seconds into scheduler ticks (0 stays 0).
    pub fn secs_to_ticks(&self, secs: u32) -> u64 {
        let tick_us = self.sub_interval().as_micros().max(1);
        (u128::from(secs) * 1_000_000 / tick_us) as u64
    }
}
