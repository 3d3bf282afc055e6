//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (the SSR output, event sinks) implement these traits.
//! The [`AppService`](super::service::AppService) and the
//! [`DutyCycleScheduler`](crate::scheduler::DutyCycleScheduler) consume them
//! via generics, so the domain core never touches hardware directly.

// ───────────────────────────────────────────────────────────────
// Pin port (driven adapter: domain → relay output)
// ───────────────────────────────────────────────────────────────

/// The single digital output that drives the solid-state relay.
///
/// Writes are fire-and-forget: an implementation that can fail must deal
/// with the failure itself (log it), because the scheduler has no feedback
/// signal to act on.
pub trait PinPort {
    /// Drive the output high (relay on) or low (relay off).
    fn set(&mut self, high: bool);
}

impl<P: PinPort + ?Sized> PinPort for &mut P {
    fn set(&mut self, high: bool) {
        (**self).set(high);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
