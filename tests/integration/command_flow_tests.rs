//! Integration tests for the JSON-RPC → dispatcher → control loop path.
//!
//! Mirrors the firmware wiring: the dispatcher writes levels straight into
//! the shared store and queues everything else on a command channel that
//! the loop drains between ticks.

use std::sync::Arc;

use embassy_sync::channel::Channel;

use super::mock_hw::{RecordingPin, RecordingSink};

use powerctl::app::events::{AppEvent, ShutdownReason};
use powerctl::app::service::AppService;
use powerctl::config::SystemConfig;
use powerctl::level::{LevelStore, PowerLevel};
use powerctl::rpc::channels::CommandChannel;
use powerctl::rpc::listener::{CommandDispatcher, Dispatch};
use powerctl::rpc::request::RequestError;

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

fn set_level(level: &str) -> Vec<u8> {
    format!(r#"{{"jsonrpc":"2.0","method":"set_power_level","params":{{"power_level":{level}}}}}"#)
        .into_bytes()
}

#[test]
fn datagram_setpoint_reaches_the_relay_at_the_next_period() {
    static CHANNEL: CommandChannel = Channel::new();
    let store = Arc::new(LevelStore::default());
    let mut app = AppService::new(&config(), Arc::clone(&store)).unwrap();
    let mut dispatcher = CommandDispatcher::new(app.level_store(), CHANNEL.sender());
    let (mut pin, mut sink) = (RecordingPin::new(), RecordingSink::new());
    app.start(&mut sink);

    for _ in 0..3 {
        app.tick(&mut pin, &mut sink);
    }
    assert_eq!(
        dispatcher.dispatch(&set_level("\"70\"")),
        Ok(Dispatch::LevelStored(PowerLevel::new(70)))
    );
    // Rest of the first period stays off.
    for _ in 0..7 {
        app.tick(&mut pin, &mut sink);
    }
    assert!(!pin.is_high());

    app.tick(&mut pin, &mut sink);
    assert!(pin.is_high());
    assert_eq!(app.build_telemetry().on_count, 7);
}

#[test]
fn queued_commands_are_applied_by_the_loop() {
    static CHANNEL: CommandChannel = Channel::new();
    let store = Arc::new(LevelStore::new(PowerLevel::new(60)));
    let mut app = AppService::new(&config(), Arc::clone(&store)).unwrap();
    let mut dispatcher = CommandDispatcher::new(app.level_store(), CHANNEL.sender());
    let receiver = CHANNEL.receiver();
    let (mut pin, mut sink) = (RecordingPin::new(), RecordingSink::new());
    app.start(&mut sink);
    app.tick(&mut pin, &mut sink);

    let pid = br#"{"jsonrpc":"2.0","method":"pid_update","params":{"P":1.5,"set_point":50,"current_temperature":30}}"#;
    assert_eq!(dispatcher.dispatch(pid), Ok(Dispatch::Queued));
    assert_eq!(
        dispatcher.dispatch(br#"{"jsonrpc":"2.0","method":"shutdown","params":{},"id":3}"#),
        Ok(Dispatch::Queued)
    );

    while let Ok(cmd) = receiver.try_receive() {
        app.handle_command(cmd, &mut pin, &mut sink);
    }

    // PID wrote 30 % before the shutdown forced the store to 0 %.
    assert!(app.is_shut_down());
    assert_eq!(store.level(), PowerLevel::OFF);
    assert!(!pin.is_high());
    assert_eq!(
        sink.transitions().last(),
        Some(&AppEvent::ShutDown(ShutdownReason::Requested))
    );
}

#[test]
fn setpoints_after_shutdown_never_reach_the_relay() {
    static CHANNEL: CommandChannel = Channel::new();
    let store = Arc::new(LevelStore::new(PowerLevel::new(40)));
    let mut app = AppService::new(&config(), Arc::clone(&store)).unwrap();
    let mut dispatcher = CommandDispatcher::new(app.level_store(), CHANNEL.sender());
    let (mut pin, mut sink) = (RecordingPin::new(), RecordingSink::new());
    app.start(&mut sink);
    app.tick(&mut pin, &mut sink);

    dispatcher
        .dispatch(br#"{"jsonrpc":"2.0","method":"shutdown","params":{}}"#)
        .unwrap();
    while let Ok(cmd) = CHANNEL.try_receive() {
        app.handle_command(cmd, &mut pin, &mut sink);
    }
    assert!(app.is_shut_down());
    let generation = store.generation();

    assert_eq!(dispatcher.dispatch(&set_level("90")), Ok(Dispatch::LevelRefused));
    assert_eq!(store.level(), PowerLevel::OFF);
    assert_eq!(store.generation(), generation);

    app.tick(&mut pin, &mut sink);
    assert_eq!(app.build_telemetry().requested, PowerLevel::OFF);
    assert!(!pin.is_high());
}

#[test]
fn full_channel_drops_instead_of_blocking() {
    static CHANNEL: CommandChannel = Channel::new();
    let mut dispatcher = CommandDispatcher::new(Arc::new(LevelStore::default()), CHANNEL.sender());
    let shutdown = br#"{"jsonrpc":"2.0","method":"shutdown","params":{}}"#;

    let results: Vec<_> = (0..10).map(|_| dispatcher.dispatch(shutdown)).collect();
    assert!(results[..8].iter().all(|r| *r == Ok(Dispatch::Queued)));
    assert!(results[8..].iter().all(|r| *r == Ok(Dispatch::QueueFull)));
    assert_eq!(dispatcher.stats().dropped, 2);
}

#[test]
fn bad_requests_leave_the_level_untouched() {
    static CHANNEL: CommandChannel = Channel::new();
    let store = Arc::new(LevelStore::new(PowerLevel::new(25)));
    let mut dispatcher = CommandDispatcher::new(Arc::clone(&store), CHANNEL.sender());

    assert_eq!(dispatcher.dispatch(&set_level("\"warm\"")), Err(RequestError::InvalidLevel));
    assert_eq!(dispatcher.dispatch(b"{"), Err(RequestError::Malformed));
    assert!(matches!(
        dispatcher.dispatch(br#"{"jsonrpc":"2.0","method":"reboot","params":{}}"#),
        Err(RequestError::UnknownMethod(_))
    ));

    assert_eq!(store.level().percent(), 25);
    assert_eq!(store.generation(), 0);
    assert_eq!(dispatcher.stats().rejected, 3);
}

#[test]
fn concurrent_setter_never_disturbs_a_period() {
    static CHANNEL: CommandChannel = Channel::new();
    let store = Arc::new(LevelStore::new(PowerLevel::new(50)));
    let mut app = AppService::new(&config(), Arc::clone(&store)).unwrap();
    let (mut pin, mut sink) = (RecordingPin::new(), RecordingSink::new());
    app.start(&mut sink);

    let writer = {
        let mut dispatcher = CommandDispatcher::new(app.level_store(), CHANNEL.sender());
        std::thread::spawn(move || {
            for i in 0..500u32 {
                let body = set_level(&(i % 101).to_string());
                dispatcher.dispatch(&body).unwrap();
            }
        })
    };

    for _ in 0..200 {
        app.tick(&mut pin, &mut sink);
    }
    writer.join().unwrap();

    // Every period is one contiguous on-block: at most one rising edge each.
    assert!(pin.rising_edges() <= 20);
    assert!(app.scheduler().edges() <= 2 * 20 + 1);
}
