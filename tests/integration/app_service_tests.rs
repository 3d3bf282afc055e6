//! Integration tests for the AppService → Supervisor → Scheduler → pin
//! pipeline.
//!
//! These run on the host and drive the service with manual ticks, the same
//! way the firmware's event loop does when the tick timer fires.

use std::sync::Arc;

use super::mock_hw::{RecordingPin, RecordingSink};

use powerctl::app::commands::{AppCommand, PidUpdate};
use powerctl::app::events::{AppEvent, ShutdownReason};
use powerctl::app::service::AppService;
use powerctl::config::SystemConfig;
use powerctl::level::{LevelStore, PowerLevel};

/// 1 s period, N = 10 → 100 ms ticks.  Supervisor features off unless a
/// test turns them on.
fn config() -> SystemConfig {
    SystemConfig {
        period_ms: 1000,
        resolution: 10,
        standby_timeout_secs: 0,
        shutdown_after_secs: 0,
        telemetry_interval_secs: 0,
        watchdog_timeout_ms: 1000,
        ..SystemConfig::default()
    }
}

struct Rig {
    app: AppService,
    store: Arc<LevelStore>,
    pin: RecordingPin,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: &SystemConfig, initial: u8) -> Self {
        let store = Arc::new(LevelStore::new(PowerLevel::new(initial)));
        let mut app = AppService::new(config, Arc::clone(&store)).unwrap();
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            store,
            pin: RecordingPin::new(),
            sink,
        }
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.app.tick(&mut self.pin, &mut self.sink);
        }
    }

    fn command(&mut self, cmd: AppCommand) {
        self.app.handle_command(cmd, &mut self.pin, &mut self.sink);
    }
}

// ── Duty cycle ────────────────────────────────────────────────

#[test]
fn half_power_toggles_twice_per_period() {
    let mut rig = Rig::new(&config(), 50);
    rig.ticks(20);

    assert_eq!(rig.pin.writes, vec![true, false, true, false]);
    assert_eq!(
        rig.sink.transitions(),
        vec![
            AppEvent::Started(PowerLevel::new(50)),
            AppEvent::LevelApplied {
                level: PowerLevel::new(50),
                on_count: 5
            },
        ]
    );
    assert_eq!(rig.app.scheduler().periods(), 2);
}

#[test]
fn mid_period_setpoint_applies_at_next_boundary() {
    let mut rig = Rig::new(&config(), 30);
    rig.ticks(4);
    rig.store.set_level(PowerLevel::new(90));
    rig.ticks(7);

    // Period 1: on 3, off 7.  Period 2 starts on at 90 %.
    assert_eq!(rig.pin.writes, vec![true, false, true]);
    let applied: Vec<u16> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::LevelApplied { on_count, .. } => Some(*on_count),
            _ => None,
        })
        .collect();
    assert_eq!(applied, vec![3, 9]);
}

#[test]
fn zero_and_full_levels_never_toggle_in_steady_state() {
    let mut off = Rig::new(&config(), 0);
    off.ticks(30);
    assert_eq!(off.pin.writes, vec![false]);

    let mut full = Rig::new(&config(), 100);
    full.ticks(30);
    assert_eq!(full.pin.writes, vec![true]);
}

#[test]
fn set_power_level_command_rounds_and_clamps() {
    let mut rig = Rig::new(&config(), 0);
    rig.command(AppCommand::SetPowerLevel(42.5));
    assert_eq!(rig.store.level().percent(), 43);
    rig.command(AppCommand::SetPowerLevel(-10.0));
    assert_eq!(rig.store.level(), PowerLevel::OFF);
    rig.command(AppCommand::SetPowerLevel(1e6));
    assert_eq!(rig.store.level(), PowerLevel::FULL);
}

// ── Standby ───────────────────────────────────────────────────

#[test]
fn silence_drops_to_standby_and_a_setpoint_restores() {
    let cfg = SystemConfig {
        standby_timeout_secs: 1,
        standby_level_percent: 20,
        ..config()
    };
    let mut rig = Rig::new(&cfg, 80);
    rig.ticks(11);

    assert!(rig.app.in_standby());
    assert_eq!(rig.store.level().percent(), 20);
    assert_eq!(
        rig.sink.transitions(),
        vec![
            AppEvent::Started(PowerLevel::new(80)),
            AppEvent::LevelApplied {
                level: PowerLevel::new(80),
                on_count: 8
            },
            AppEvent::StandbyEntered(PowerLevel::new(20)),
            AppEvent::LevelApplied {
                level: PowerLevel::new(20),
                on_count: 2
            },
        ]
    );

    rig.store.set_level(PowerLevel::new(60));
    rig.ticks(1);
    assert!(!rig.app.in_standby());
    assert_eq!(rig.store.level().percent(), 60);
    assert_eq!(rig.sink.transitions().last(), Some(&AppEvent::StandbyExited));
}

#[test]
fn low_levels_are_left_alone_by_standby() {
    let cfg = SystemConfig {
        standby_timeout_secs: 1,
        standby_level_percent: 20,
        ..config()
    };
    let mut rig = Rig::new(&cfg, 15);
    rig.ticks(50);
    assert!(!rig.app.in_standby());
    assert_eq!(rig.store.level().percent(), 15);
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn run_limit_forces_output_off_for_good() {
    let cfg = SystemConfig {
        shutdown_after_secs: 2,
        ..config()
    };
    let mut rig = Rig::new(&cfg, 100);
    rig.ticks(25);

    assert!(rig.app.is_shut_down());
    assert_eq!(rig.pin.writes, vec![true, false]);
    assert!(!rig.pin.is_high());
    assert_eq!(rig.store.level(), PowerLevel::OFF);
    assert_eq!(rig.app.tick_count(), 20);
    assert_eq!(
        rig.sink.transitions().last(),
        Some(&AppEvent::ShutDown(ShutdownReason::RunLimit))
    );
}

#[test]
fn shutdown_command_deasserts_and_ignores_later_commands() {
    let mut rig = Rig::new(&config(), 50);
    rig.ticks(3);
    assert!(rig.pin.is_high());

    rig.command(AppCommand::Shutdown);
    assert!(!rig.pin.is_high());
    assert!(!rig.app.scheduler().is_running());

    rig.command(AppCommand::SetPowerLevel(90.0));
    rig.command(AppCommand::Shutdown);
    rig.ticks(20);

    assert_eq!(rig.store.level(), PowerLevel::OFF);
    assert_eq!(rig.pin.writes, vec![true, false]);
    let shutdowns = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::ShutDown(_)))
        .count();
    assert_eq!(shutdowns, 1);
}

// ── Temperature loop ──────────────────────────────────────────

#[test]
fn pid_sample_sets_the_level() {
    let mut rig = Rig::new(&config(), 0);
    rig.command(AppCommand::PidUpdate(PidUpdate {
        kp: Some(2.0),
        set_point: Some(100.0),
        current_temperature: Some(90.0),
        ..PidUpdate::default()
    }));
    assert_eq!(rig.store.level().percent(), 20);

    rig.ticks(1);
    assert_eq!(
        rig.sink.transitions().last(),
        Some(&AppEvent::LevelApplied {
            level: PowerLevel::new(20),
            on_count: 2
        })
    );
}

#[test]
fn pid_tuning_without_sample_leaves_level() {
    let mut rig = Rig::new(&config(), 35);
    rig.command(AppCommand::PidUpdate(PidUpdate {
        kp: Some(1.0),
        ..PidUpdate::default()
    }));
    assert_eq!(rig.store.level().percent(), 35);
    assert_eq!(rig.store.generation(), 0);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_is_periodic() {
    let cfg = SystemConfig {
        telemetry_interval_secs: 1,
        ..config()
    };
    let mut rig = Rig::new(&cfg, 40);
    rig.ticks(30);
    assert_eq!(rig.sink.telemetry_count(), 3);

    let Some(AppEvent::Telemetry(t)) = rig.sink.events.last() else {
        panic!("expected telemetry last");
    };
    assert_eq!(t.applied.percent(), 40);
    assert_eq!(t.on_count, 4);
    assert_eq!(t.resolution, 10);
    assert_eq!(t.periods, 3);
    assert_eq!(t.edges, 6);
    assert!(!t.output_on);
}
