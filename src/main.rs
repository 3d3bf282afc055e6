//! PowerCtl Firmware: Main Entry Point
//!
//! Hexagonal architecture with a timer-driven control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SsrDriver (PinPort)   LogEventSink (EventSink)   WifiAdapter  │
//! │  CommandListener (UDP JSON-RPC, own thread)                    │
//! │  WebServer (HTTP setpoint form, httpd task)                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Supervisor · DutyCycleScheduler · PID                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  esp_timer ──▶ event queue ──▶ main loop                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use powerctl::adapters::log_sink::LogEventSink;
use powerctl::app::service::AppService;
use powerctl::config::SystemConfig;
use powerctl::drivers::hw_timer;
use powerctl::drivers::ssr::SsrDriver;
use powerctl::drivers::task_pin::{spawn_on_core, Core};
use powerctl::drivers::watchdog::Watchdog;
use powerctl::events::{self, Event};
use powerctl::level::LevelStore;
use powerctl::rpc::channels::CMD_CHANNEL;
use powerctl::rpc::listener::{CommandDispatcher, CommandListener};

#[cfg(target_os = "espidf")]
use powerctl::adapters::web::{SetpointForm, WebServer};
#[cfg(target_os = "espidf")]
use powerctl::adapters::wifi::{WifiAdapter, WifiCredentials};

/// Main-loop poll interval while waiting for timer events.
#[cfg(target_os = "espidf")]
const LOOP_POLL_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("PowerCtl v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config()?;
    info!(
        "Config: period={} ms, resolution={}, sub-interval={} ms, initial={}%",
        config.period_ms,
        config.resolution,
        config.sub_interval().as_millis(),
        config.initial_level_percent
    );

    // ── 3. Peripherals ────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    let (mut ssr, mut wifi) = {
        use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
        use esp_idf_hal::peripherals::Peripherals;
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;

        let peripherals = Peripherals::take()?;
        // SAFETY: the SSR GPIO is not claimed through `peripherals.pins`
        // anywhere else in the firmware.
        let ssr_pin = unsafe { AnyOutputPin::new(powerctl::pins::SSR_GPIO) };
        let ssr = SsrDriver::new(PinDriver::output(ssr_pin)?);

        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take().ok();
        let wifi = match WifiCredentials::from_build_env() {
            Ok(creds) => WifiAdapter::connect(peripherals.modem, sysloop, nvs, &creds)
                .inspect_err(|e| warn!("WiFi unavailable ({}), running offline", e))
                .ok(),
            Err(e) => {
                warn!("WiFi disabled: {}", e);
                None
            }
        };
        (ssr, wifi)
    };

    #[cfg(not(target_os = "espidf"))]
    let mut ssr = SsrDriver::new(sim::SimPin);

    // ── 4. Application core ───────────────────────────────────
    let store = Arc::new(LevelStore::new(config.initial_level()));
    let mut app = AppService::new(&config, Arc::clone(&store))?;
    let mut sink = LogEventSink::new();

    // ── 5. Command listener ───────────────────────────────────
    let dispatcher = CommandDispatcher::new(app.level_store(), CMD_CHANNEL.sender());
    match CommandListener::bind(config.command_udp_port, dispatcher) {
        Ok(listener) => {
            let _rx_task = spawn_on_core(Core::Pro, 5, 8, "udp-rx\0", move || listener.run())?;
        }
        Err(e) => warn!("Command listener disabled: {}", e),
    }

    #[cfg(target_os = "espidf")]
    let _web = match config.web_port {
        0 => None,
        port => WebServer::start(port, SetpointForm::new(app.level_store()))
            .inspect_err(|e| warn!("Setpoint form disabled: {}", e))
            .ok(),
    };

    // ── 6. Start ticking ──────────────────────────────────────
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);
    app.start(&mut sink);
    hw_timer::start_tick_timer(config.sub_interval())?;
    let commands = CMD_CHANNEL.receiver();
    let mut timer_running = true;

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    loop {
        // Simulate the tick timer via sleep on non-espidf targets.
        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(config.sub_interval());
            events::push_event(Event::SubIntervalTick);
        }
        #[cfg(target_os = "espidf")]
        esp_idf_hal::delay::FreeRtos::delay_ms(LOOP_POLL_MS);

        events::drain_events(|event| match event {
            Event::SubIntervalTick => app.tick(&mut ssr, &mut sink),
        });

        let dropped = events::take_dropped();
        if dropped > 0 {
            warn!("Event loop overrun: {} ticks dropped", dropped);
        }

        while let Ok(cmd) = commands.try_receive() {
            app.handle_command(cmd, &mut ssr, &mut sink);
        }

        if timer_running && app.is_shut_down() {
            hw_timer::stop_tick_timer();
            timer_running = false;
            info!("Tick timer stopped; output held off until reboot");
        }

        #[cfg(target_os = "espidf")]
        if let Some(link) = wifi.as_mut() {
            link.poll();
        }

        watchdog.feed();
    }
}

/// Defaults, or a JSON document baked in at build time.
fn load_config() -> Result<SystemConfig> {
    match option_env!("POWERCTL_CONFIG_JSON") {
        Some(json) => {
            info!("Config: build-time JSON override");
            Ok(SystemConfig::from_json(json)?)
        }
        None => {
            let config = SystemConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::convert::Infallible;

    use embedded_hal::digital::{ErrorType, OutputPin};

    /// Host stand-in for the SSR GPIO.
    pub struct SimPin;

    impl ErrorType for SimPin {
        type Error = Infallible;
    }

    impl OutputPin for SimPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            log::debug!("SSR(sim): LOW");
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            log::debug!("SSR(sim): HIGH");
            Ok(())
        }
    }
}
