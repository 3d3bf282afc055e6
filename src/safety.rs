//! Setpoint supervisor.
//!
//! The supervisor runs **every tick before the scheduler** and guards the
//! load against two situations:
//!
//! 1. **Setpoint silence.**  If no external level write arrives for the
//!    standby timeout while the level is above the standby level, the
//!    stored level is overridden with the standby level.  The override
//!    does not count as setpoint activity; the next external write ends
//!    standby.
//! 2. **Run limit.**  After the configured run time the supervisor
//!    requests a shutdown, which the service turns into output-off and a
//!    stopped scheduler.
//!
//! Time is counted in scheduler ticks, so the supervisor shares the
//! scheduler's single timing authority.

use crate::config::SystemConfig;
use crate::level::{LevelStore, PowerLevel};
use log::{error, info};

/// What the service must do after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorAction {
    None,
    EnterStandby(PowerLevel),
    ExitStandby,
    Shutdown,
}

pub struct Supervisor {
    standby_level: PowerLevel,
    /// Silence (ticks) before standby; 0 disables.
    standby_timeout_ticks: u64,
    /// Run time (ticks) before shutdown; 0 disables.
    shutdown_after_ticks: u64,
    last_generation: u32,
    idle_ticks: u64,
    run_ticks: u64,
    standby: bool,
    shutdown: bool,
}

impl Supervisor {
    pub fn new(config: &SystemConfig, store: &LevelStore) -> Self {
        Self {
            standby_level: config.standby_level(),
            standby_timeout_ticks: config.secs_to_ticks(config.standby_timeout_secs),
            shutdown_after_ticks: config.secs_to_ticks(config.shutdown_after_secs),
            last_generation: store.generation(),
            idle_ticks: 0,
            run_ticks: 0,
            standby: false,
            shutdown: false,
        }
    }

    /// Evaluate once per tick.
    pub fn evaluate(&mut self, store: &LevelStore) -> SupervisorAction {
        if self.shutdown {
            return SupervisorAction::None;
        }

        // ── Run limit ─────────────────────────────────────────────
        self.run_ticks = self.run_ticks.saturating_add(1);
        if self.shutdown_after_ticks > 0 && self.run_ticks >= self.shutdown_after_ticks {
            error!("Supervisor: run limit reached after {} ticks", self.run_ticks);
            self.shutdown = true;
            return SupervisorAction::Shutdown;
        }

        // ── Setpoint activity ────────────────────────────────────
        let generation = store.generation();
        if generation != self.last_generation {
            self.last_generation = generation;
            self.idle_ticks = 0;
            if self.standby {
                self.standby = false;
                info!("Supervisor: setpoint update, leaving standby");
                return SupervisorAction::ExitStandby;
            }
            return SupervisorAction::None;
        }

        // ── Standby timeout ──────────────────────────────────────
        self.idle_ticks = self.idle_ticks.saturating_add(1);
        if !self.standby
            && self.standby_timeout_ticks > 0
            && self.idle_ticks > self.standby_timeout_ticks
            && store.level() > self.standby_level
        {
            self.standby = true;
            store.override_level(self.standby_level);
            info!(
                "Supervisor: no setpoint for {} ticks, standby at {}",
                self.idle_ticks, self.standby_level
            );
            return SupervisorAction::EnterStandby(self.standby_level);
        }

        SupervisorAction::None
    }

    /// Latch shutdown from outside (e.g. a `shutdown` command).
    pub fn latch_shutdown(&mut self) {
        self.shutdown = true;
    }

    pub fn in_standby(&self) -> bool {
        self.standby
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown
    }
}
