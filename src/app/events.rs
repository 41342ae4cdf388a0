//! Outbound application events.
//!
//! The [`BeaconService`](super::service::BeaconService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; in firmware they go to the serial log.

use crate::error::RadioError;
use crate::sensors::SupplyReading;
use crate::session::SessionResult;

use super::service::LoopState;

/// Which radio operation a [`AppEvent::RadioFault`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioOp {
    Enable,
    Configure,
    Start,
    Stop,
}

/// Structured events emitted by the beacon core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service started (radio enable attempted).
    Started,

    /// The main loop moved between states.
    StateChanged { from: LoopState, to: LoopState },

    /// The companion rail was energized.
    SessionStarted,

    /// The companion session ended and the rail is off again.
    SessionFinished(SessionResult),

    /// Battery too low to power the companion; session skipped.
    SessionSkipped { battery_mv: u16 },

    /// One advertising burst began with this payload.
    Burst(SupplyReading),

    /// A best-effort radio call failed.
    RadioFault { op: RadioOp, error: RadioError },

    /// A beacon window ran to its deadline.
    WindowFinished { bursts: u32, radio_faults: u32 },
}
