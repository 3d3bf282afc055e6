//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the duty-cycle scheduler, the supervisor and the
//! temperature loop, and holds a handle to the shared [`LevelStore`].
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  LevelStore ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService           │
//!    PinPort ◀────│ Supervisor · Scheduler · PID  │
//!                 └──────────────────────────────┘
//! ```

use std::sync::Arc;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::control::TemperatureLoop;
use crate::error::Result;
use crate::level::{LevelStore, PowerLevel};
use crate::safety::{Supervisor, SupervisorAction};
use crate::scheduler::DutyCycleScheduler;

use super::commands::AppCommand;
use super::events::{AppEvent, ShutdownReason, TelemetryData};
use super::ports::{EventSink, PinPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    store: Arc<LevelStore>,
    scheduler: DutyCycleScheduler,
    supervisor: Supervisor,
    temperature: TemperatureLoop,
    /// Seconds per scheduler tick (derived from config).
    tick_secs: f32,
    tick_count: u64,
    /// Telemetry cadence in ticks; 0 disables.
    telemetry_ticks: u64,
    /// `on_count` of the previous period, for change reporting.
    last_on_count: Option<u16>,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Rejects invalid configuration; does **not** start scheduling;
    /// call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig, store: Arc<LevelStore>) -> Result<Self> {
        config.validate()?;
        let scheduler = DutyCycleScheduler::new(&config.scheduler_config())?;
        let supervisor = Supervisor::new(config, &store);
        let temperature = TemperatureLoop::new(config);

        Ok(Self {
            store,
            scheduler,
            supervisor,
            temperature,
            tick_secs: config.sub_interval().as_secs_f32(),
            tick_count: 0,
            telemetry_ticks: config.secs_to_ticks(config.telemetry_interval_secs),
            last_on_count: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.scheduler.start();
        let level = self.store.level();
        sink.emit(&AppEvent::Started(level));
        info!("AppService started at {}", level);
    }

    /// Force the output off and stop scheduling for good.  The level store
    /// is locked at 0 %, so setter threads cannot write it afterwards.
    pub fn shutdown(
        &mut self,
        reason: ShutdownReason,
        pin: &mut impl PinPort,
        sink: &mut impl EventSink,
    ) {
        if !self.scheduler.is_running() && self.supervisor.is_shut_down() {
            return;
        }
        warn!("AppService shutting down ({:?})", reason);
        self.supervisor.latch_shutdown();
        self.store.lock(PowerLevel::OFF);
        self.scheduler.stop(pin);
        sink.emit(&AppEvent::ShutDown(reason));
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one sub-interval: supervisor → scheduler → events.
    pub fn tick(&mut self, pin: &mut impl PinPort, sink: &mut impl EventSink) {
        if self.is_shut_down() {
            return;
        }
        self.tick_count += 1;

        // 1. Supervisor (may override the stored level)
        match self.supervisor.evaluate(&self.store) {
            SupervisorAction::None => {}
            SupervisorAction::EnterStandby(level) => sink.emit(&AppEvent::StandbyEntered(level)),
            SupervisorAction::ExitStandby => sink.emit(&AppEvent::StandbyExited),
            SupervisorAction::Shutdown => {
                self.shutdown(ShutdownReason::RunLimit, pin, sink);
                return;
            }
        }

        // 2. Scheduler
        if let Some(outcome) = self.scheduler.tick(&self.store, pin) {
            if outcome.period_started {
                let state = self.scheduler.state();
                if self.last_on_count != Some(state.on_count) {
                    self.last_on_count = Some(state.on_count);
                    sink.emit(&AppEvent::LevelApplied {
                        level: state.snapshot,
                        on_count: state.on_count,
                    });
                }
            }
        }

        // 3. Telemetry
        if self.telemetry_ticks > 0 && self.tick_count % self.telemetry_ticks == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one command on the control loop.
    ///
    /// Network listeners write setpoints into the [`LevelStore`] directly and
    /// only queue the other commands; `SetPowerLevel` here serves in-process
    /// callers that own the service rather than a store handle.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        pin: &mut impl PinPort,
        sink: &mut impl EventSink,
    ) {
        if self.is_shut_down() {
            warn!("Command {:?} ignored after shutdown", cmd);
            return;
        }
        match cmd {
            AppCommand::SetPowerLevel(percent) => match self.store.set_percent(percent) {
                Some(level) => info!("Setpoint: {} (requested {:.1})", level, percent),
                None => warn!("Setpoint {:.1} refused, level store locked", percent),
            },
            AppCommand::PidUpdate(update) => {
                if let Some(level) = self.temperature.apply(&update, self.tick_count, self.tick_secs) {
                    self.store.set_level(level);
                }
            }
            AppCommand::Shutdown => {
                self.shutdown(ShutdownReason::Requested, pin, sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        let state = self.scheduler.state();
        TelemetryData {
            requested: self.store.level(),
            applied: state.snapshot,
            on_count: state.on_count,
            resolution: self.scheduler.resolution(),
            output_on: state.driven.unwrap_or(false),
            standby: self.supervisor.in_standby(),
            periods: self.scheduler.periods(),
            edges: self.scheduler.edges(),
        }
    }

    /// Shared handle for external setters.
    pub fn level_store(&self) -> Arc<LevelStore> {
        Arc::clone(&self.store)
    }

    pub fn scheduler(&self) -> &DutyCycleScheduler {
        &self.scheduler
    }

    pub fn is_shut_down(&self) -> bool {
        self.supervisor.is_shut_down()
    }

    pub fn in_standby(&self) -> bool {
        self.supervisor.in_standby()
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
