//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (JSON-RPC over
//! UDP today) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.
//!
//! The UDP and HTTP front ends write setpoints straight into the shared
//! [`LevelStore`](crate::level::LevelStore), so `SetPowerLevel` never
//! crosses the command channel.  It exists for in-process callers that
//! drive [`AppService::handle_command`](super::service::AppService::handle_command)
//! directly.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Request a new power level in percent.  Clamped and rounded on entry;
    /// refused once the controller has shut down.
    SetPowerLevel(f32),

    /// Retune the temperature loop and/or feed it a new temperature sample.
    PidUpdate(PidUpdate),

    /// Force the output off and stop scheduling until reboot.
    Shutdown,
}

/// Partial PID update.  Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidUpdate {
    pub kp: Option<f32>,
    pub ki: Option<f32>,
    pub kd: Option<f32>,
    pub set_point: Option<f32>,
    /// A fresh temperature sample; only updates carrying one produce output.
    pub current_temperature: Option<f32>,
}
