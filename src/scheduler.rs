//! Duty-cycle scheduler engine.
//!
//! Splits a fixed period into `N` equal sub-intervals and drives the SSR
//! output as one contiguous "on" block followed by one contiguous "off"
//! block.  Contiguous blocks keep relay wear to at most one rising and one
//! falling edge per period.
//!
//! ```text
//!   level snapshot taken here          on_count = round(level·N / MAX)
//!   │
//!   ▼
//!   ┌────┬────┬────┬────┬────┬────┬────┬────┬────┬────┐
//!   │ ON │ ON │ ON │ ON │ ON │off │off │off │off │off │   N = 10, level = 50
//!   └────┴────┴────┴────┴────┴────┴────┴────┴────┴────┘
//!   0    1    2    3    4    5 ◀── Asserting → Deasserting
//! ```
//!
//! The scheduler is driven by an external tick source (hardware timer on
//! the device, a manual loop in tests) and talks to the relay only through
//! [`PinPort`], so it is testable without hardware.

use core::time::Duration;

use log::{debug, info};

use crate::app::ports::PinPort;
use crate::error::{Error, Result};
use crate::level::{LevelStore, PowerLevel};

// ═══════════════════════════════════════════════════════════════
//  Configuration
// ═══════════════════════════════════════════════════════════════

/// Construction-time parameters.  Immutable once the scheduler exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Length of one full on/off cycle.
    pub period: Duration,
    /// Number of sub-intervals per period (`N`).
    pub resolution: u16,
    /// Level the store starts with.
    pub initial_level: PowerLevel,
}

impl SchedulerConfig {
    /// Reject configurations the scheduler cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(Error::Config("resolution must be at least 1"));
        }
        if self.period.is_zero() {
            return Err(Error::Config("period must be greater than zero"));
        }
        if self.sub_interval().is_zero() {
            return Err(Error::Config("period too short for resolution"));
        }
        Ok(())
    }

    /// Duration of one tick (`period / N`).
    pub fn sub_interval(&self) -> Duration {
        if self.resolution == 0 {
            return Duration::ZERO;
        }
        self.period / u32::from(self.resolution)
    }
}

/// Number of asserted sub-intervals for `level` at resolution `n`.
///
/// `round_half_up(level · n / MAX)`, in integer arithmetic so every level
/// maps to an exact, reproducible count.
pub fn on_count(level: PowerLevel, n: u16) -> u16 {
    let max = u32::from(PowerLevel::MAX);
    let scaled = 2 * u32::from(level.percent()) * u32::from(n) + max;
    (scaled / (2 * max)) as u16
}

// ═══════════════════════════════════════════════════════════════
//  State
// ═══════════════════════════════════════════════════════════════

/// Per-period state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `tick < on_count`: output asserted.
    Asserting,
    /// `tick >= on_count`: output deasserted until the period ends.
    Deasserting,
}

/// Runtime state, exclusively owned by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    /// Index of the next sub-interval to execute, in `[0, N)`.
    pub tick: u16,
    /// Value last written to the pin; `None` until the first write.
    pub driven: Option<bool>,
    /// Level captured at the start of the in-progress period.
    pub snapshot: PowerLevel,
    /// `on_count` derived from `snapshot`.
    pub on_count: u16,
    pub phase: Phase,
}

/// What happened during one [`DutyCycleScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Sub-interval index that was executed.
    pub index: u16,
    /// Desired output for that sub-interval.
    pub asserted: bool,
    /// Whether the pin was written.
    pub toggled: bool,
    /// Whether this tick began a new period (level snapshot taken).
    pub period_started: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct DutyCycleScheduler {
    resolution: u16,
    sub_interval: Duration,
    state: ScheduleState,
    running: bool,
    /// Completed periods since start.
    periods: u64,
    /// Pin writes since construction.
    edges: u64,
}

impl DutyCycleScheduler {
    /// Build a scheduler.  Fails with [`Error::Config`] on `N = 0` or a zero
    /// period; never fails afterwards.
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Scheduler: period={}ms N={} tick={}ms",
            config.period.as_millis(),
            config.resolution,
            config.sub_interval().as_millis()
        );
        Ok(Self {
            resolution: config.resolution,
            sub_interval: config.sub_interval(),
            state: ScheduleState {
                tick: 0,
                driven: None,
                snapshot: config.initial_level,
                on_count: on_count(config.initial_level, config.resolution),
                phase: Phase::Asserting,
            },
            running: false,
            periods: 0,
            edges: 0,
        })
    }

    /// Arm the scheduler; the next tick starts a fresh period.
    pub fn start(&mut self) {
        self.state.tick = 0;
        self.state.phase = Phase::Asserting;
        self.running = true;
        info!("Scheduler: started");
    }

    /// Stop scheduling and deassert the output.
    pub fn stop(&mut self, pin: &mut impl PinPort) {
        self.running = false;
        self.state.tick = 0;
        self.drive(false, pin);
        info!("Scheduler: stopped, output deasserted");
    }

    /// Execute one sub-interval.  Call once every [`sub_interval`](Self::sub_interval).
    ///
    /// Returns `None` while stopped.
    pub fn tick(&mut self, store: &LevelStore, pin: &mut impl PinPort) -> Option<TickOutcome> {
        if !self.running {
            return None;
        }

        let index = self.state.tick;
        let period_started = index == 0;
        if period_started {
            let snapshot = store.level();
            self.state.snapshot = snapshot;
            self.state.on_count = on_count(snapshot, self.resolution);
            self.state.phase = Phase::Asserting;
        }

        if self.state.phase == Phase::Asserting && index >= self.state.on_count {
            self.state.phase = Phase::Deasserting;
            debug!("Scheduler: deasserting at tick {}", index);
        }

        let asserted = self.state.phase == Phase::Asserting;
        let toggled = self.drive(asserted, pin);

        self.state.tick += 1;
        if self.state.tick == self.resolution {
            self.state.tick = 0;
            self.periods += 1;
        }

        Some(TickOutcome {
            index,
            asserted,
            toggled,
            period_started,
        })
    }

    /// Toggle-on-change pin write.  Returns whether the pin was written.
    fn drive(&mut self, high: bool, pin: &mut impl PinPort) -> bool {
        if self.state.driven == Some(high) {
            return false;
        }
        pin.set(high);
        self.state.driven = Some(high);
        self.edges += 1;
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    pub fn sub_interval(&self) -> Duration {
        self.sub_interval
    }

    pub fn periods(&self) -> u64 {
        self.periods
    }

    pub fn edges(&self) -> u64 {
        self.edges
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
