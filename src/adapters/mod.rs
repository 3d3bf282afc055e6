//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to             |
//! |------------|------------|-------------------------|
//! | `log_sink` | EventSink  | Serial log output       |
//! | `web`      | n/a        | ESP-IDF httpd (setpoint form) |
//! | `wifi`     | n/a        | ESP-IDF WiFi STA        |
//!
//! The SSR output ([`crate::drivers::ssr::SsrDriver`]) implements
//! `PinPort` directly.

pub mod log_sink;
pub mod web;
pub mod wifi;
