//! Sub-interval tick timer using ESP-IDF's esp_timer API.
//!
//! One periodic timer fires every scheduler sub-interval and pushes
//! [`Event::SubIntervalTick`] into the lock-free SPSC queue.  On simulation
//! targets the main loop sleeps instead and no timer is created.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() which only touches atomics.

use core::time::Duration;

use crate::error::InitError;

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: TICK_TIMER is written once in `start_tick_timer()` before any
/// callbacks fire.  Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn tick_timer() -> esp_timer_handle_t { unsafe { TICK_TIMER } }

#[cfg(target_os = "espidf")]
unsafe extern "C" fn sub_interval_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::SubIntervalTick);
}

/// Start the periodic sub-interval timer.
#[cfg(target_os = "espidf")]
pub fn start_tick_timer(sub_interval: Duration) -> Result<(), InitError> {
    let period_us = sub_interval.as_micros() as u64;
    // SAFETY: TICK_TIMER is written here once at boot from the main task
    // before the timer is started.  The callback only calls push_event().
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(sub_interval_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"ssr-tick".as_ptr(),
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK {
            return Err(InitError::TimerCreateFailed(ret));
        }
        let ret = esp_timer_start_periodic(TICK_TIMER, period_us);
        if ret != ESP_OK {
            return Err(InitError::TimerStartFailed(ret));
        }
    }
    info!("hw_timer: sub-interval tick every {} ms", sub_interval.as_millis());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_tick_timer(sub_interval: Duration) -> Result<(), InitError> {
    log::info!(
        "hw_timer(sim): no timer, main loop sleeps {} ms per tick",
        sub_interval.as_millis()
    );
    Ok(())
}

/// Stop the tick timer.  Safe to call when it was never started.
#[cfg(target_os = "espidf")]
pub fn stop_tick_timer() {
    // SAFETY: tick_timer() contract, main task only; null-check covers a
    // failed or skipped start.
    unsafe {
        let t = tick_timer();
        if !t.is_null() {
            esp_timer_stop(t);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_tick_timer() {}
