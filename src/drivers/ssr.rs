//! Solid-state relay output driver.
//!
//! Wraps any `embedded-hal` [`OutputPin`] and exposes it as the domain's
//! [`PinPort`].  HIGH energises the SSR input LED, i.e. load on.
//!
//! ## Failure contract
//!
//! The scheduler treats pin writes as infallible.  A failed write is
//! logged here and the driver's notion of the output is left unchanged,
//! so the next differing command is still issued.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: wraps an `esp_idf_hal::gpio::PinDriver` in output mode.
//! On host/test: wraps any in-memory `OutputPin` implementation.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::PinPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsrState {
    Off,
    On,
}

pub struct SsrDriver<P> {
    pin: P,
    state: SsrState,
    /// Successful off→on transitions.
    switch_ons: u32,
    /// Failed writes.
    write_errors: u32,
}

impl<P: OutputPin> SsrDriver<P> {
    /// Take ownership of the pin and drive it low.
    pub fn new(pin: P) -> Self {
        let mut driver = Self {
            pin,
            state: SsrState::On,
            switch_ons: 0,
            write_errors: 0,
        };
        driver.off();
        driver
    }

    pub fn on(&mut self) {
        if self.pin.set_high().is_ok() {
            if self.state == SsrState::Off {
                self.switch_ons = self.switch_ons.wrapping_add(1);
            }
            self.state = SsrState::On;
        } else {
            self.write_errors = self.write_errors.wrapping_add(1);
            warn!("SSR: set_high failed");
        }
    }

    pub fn off(&mut self) {
        if self.pin.set_low().is_ok() {
            self.state = SsrState::Off;
        } else {
            self.write_errors = self.write_errors.wrapping_add(1);
            warn!("SSR: set_low failed");
        }
    }

    pub fn state(&self) -> SsrState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == SsrState::On
    }

    pub fn switch_ons(&self) -> u32 {
        self.switch_ons
    }

    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    /// Release the pin, leaving it low.
    pub fn release(mut self) -> P {
        self.off();
        self.pin
    }
}

impl<P: OutputPin> PinPort for SsrDriver<P> {
    fn set(&mut self, high: bool) {
        if high {
            self.on();
        } else {
            self.off();
        }
    }
}
