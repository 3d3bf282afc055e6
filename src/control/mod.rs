//! Closed-loop temperature control.
//!
//! An external sensor loop reports temperatures through `pid_update`
//! commands; each sample runs one PID step and the clamped output becomes
//! the requested power level.  The controller is created lazily on the
//! first update so a controller that is only ever driven by direct
//! setpoints never carries PID state.

pub mod pid;

use log::info;

use crate::app::commands::PidUpdate;
use crate::config::SystemConfig;
use crate::level::PowerLevel;

use pid::PidController;

pub struct TemperatureLoop {
    pid: Option<PidController>,
    defaults: (f32, f32, f32, f32),
    last_sample_tick: Option<u64>,
}

impl TemperatureLoop {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            pid: None,
            defaults: (config.pid_kp, config.pid_ki, config.pid_kd, config.pid_set_point),
            last_sample_tick: None,
        }
    }

    /// Apply a partial update.  Returns the new power level when the update
    /// carried a temperature sample.
    ///
    /// `now_tick` is the service tick counter; `tick_secs` the tick length.
    pub fn apply(&mut self, update: &PidUpdate, now_tick: u64, tick_secs: f32) -> Option<PowerLevel> {
        let (kp0, ki0, kd0, sp0) = self.defaults;
        let pid = self.pid.get_or_insert_with(|| {
            info!("TemperatureLoop: controller initialised");
            let mut pid = PidController::new(kp0, ki0, kd0, sp0);
            pid.set_limits(0.0, f32::from(PowerLevel::MAX));
            pid
        });

        let (kp, ki, kd) = pid.gains();
        pid.set_gains(
            update.kp.unwrap_or(kp),
            update.ki.unwrap_or(ki),
            update.kd.unwrap_or(kd),
        );
        if let Some(sp) = update.set_point {
            pid.set_target(sp);
        }

        let temperature = update.current_temperature?;
        let elapsed_ticks = self
            .last_sample_tick
            .map_or(1, |last| now_tick.saturating_sub(last).max(1));
        self.last_sample_tick = Some(now_tick);

        let output = pid.compute(temperature, elapsed_ticks as f32 * tick_secs);
        let level = PowerLevel::from_percent(output);
        info!(
            "TemperatureLoop: T={:.1} target={:.1} -> {}",
            temperature,
            pid.target(),
            level
        );
        Some(level)
    }

    pub fn is_active(&self) -> bool {
        self.pid.is_some()
    }
}
