//! Application core: pure domain logic, zero I/O.
//!
//! Business rules for the power controller: duty-cycle scheduling,
//! setpoint supervision and the temperature loop.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
