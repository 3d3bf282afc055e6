//! Unified error types for the power controller firmware.
//!
//! A single `Error` enum that configuration, scheduler construction and
//! peripheral bring-up all funnel into.  Variants are `Copy` so they can be
//! passed around the control loop without allocation.
//!
//! Out-of-range power levels are **not** errors: they are clamped where they
//! enter the system so the relay output is always defined.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid; the controller refuses to start.
    Config(&'static str),
    /// Peripheral, timer or socket initialisation failed.
    Init(InitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Initialisation errors
// ---------------------------------------------------------------------------

/// Errors during one-shot peripheral bring-up.  The `i32` payloads carry the
/// raw ESP-IDF return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    GpioConfigFailed,
    TimerCreateFailed(i32),
    TimerStartFailed(i32),
    SocketBindFailed,
    HttpServerFailed(i32),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioConfigFailed => write!(f, "SSR GPIO config failed"),
            Self::TimerCreateFailed(rc) => write!(f, "tick timer create failed (rc={})", rc),
            Self::TimerStartFailed(rc) => write!(f, "tick timer start failed (rc={})", rc),
            Self::SocketBindFailed => write!(f, "command socket bind failed"),
            Self::HttpServerFailed(rc) => write!(f, "HTTP server start failed (rc={})", rc),
        }
    }
}

impl core::error::Error for InitError {}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
