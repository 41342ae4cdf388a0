//! Port traits — the hexagonal boundary between beacon logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BeaconService (domain)
//! ```
//!
//! Driven adapters (clock, ADC sampler, BLE advertiser, event sink) implement
//! these traits.  The companion power rail and done-signal line use the
//! `embedded-hal` 1.0 digital traits directly, with [`EdgeSignal`] adding the
//! interrupt arm/disarm the HAL does not model.  The core consumes all of them
//! via generics and never touches hardware itself.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

use crate::advertising::Advertisement;
use crate::error::RadioError;
use crate::events::EdgeQueue;
use crate::sensors::SupplyReading;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus a blocking sleep.
///
/// Sleeping blocks the only control thread on purpose: while the beacon
/// waits there is nothing else to run.
pub trait Clock {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Sampler port (driven adapter: ADC → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the two supply channels.
pub trait SensorSampler {
    /// Sample both channels and return scaled millivolts.
    fn sample(&mut self) -> SupplyReading;
}

// ───────────────────────────────────────────────────────────────
// Advertiser port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Non-connectable broadcast control.
///
/// Every method is best-effort from the domain's point of view: failures
/// are reported, logged by the caller, and never stop the main loop.
pub trait Advertiser {
    /// Bring the radio stack up.  Called once at startup.
    fn enable(&mut self) -> Result<(), RadioError>;

    /// Load the advertisement (static fields and current payload).
    fn configure(&mut self, advertisement: &Advertisement) -> Result<(), RadioError>;

    /// Start broadcasting the configured advertisement.
    fn start(&mut self) -> Result<(), RadioError>;

    /// Stop broadcasting.
    fn stop(&mut self) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Edge-capable input (driven adapter: GPIO ISR → domain)
// ───────────────────────────────────────────────────────────────

/// A digital input that can report falling edges from interrupt context.
///
/// While armed, every falling edge is pushed into `queue` as a timestamped
/// [`EdgeEvent`](crate::events::EdgeEvent).  The queue is `'static`
/// because the interrupt handler outlives any stack frame.
pub trait EdgeSignal: InputPin {
    /// Attach the falling-edge observer.
    fn arm_falling_edge(&mut self, queue: &'static EdgeQueue) -> Result<(), Self::Error>;

    /// Detach the observer.  Disarming an unarmed line is a no-op.
    fn disarm(&mut self) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
