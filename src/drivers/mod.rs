//! Actuator drivers, the tick timer and peripheral helpers.

pub mod hw_timer;
pub mod ssr;
pub mod task_pin;
pub mod watchdog;
