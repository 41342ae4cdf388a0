//! Error types for the beacon firmware.
//!
//! Nothing in this firmware is fatal: every error below is logged by the
//! component that hits it and the main loop carries on.  The enums are
//! small and `Copy` so they can be passed into [`AppEvent`]s and log
//! lines without allocation.
//!
//! [`AppEvent`]: crate::app::events::AppEvent

use core::fmt;

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

/// Failures reported by an [`Advertiser`](crate::app::ports::Advertiser).
///
/// The `i32` carries the vendor stack's return code where there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Controller / host stack could not be brought up.
    StackInit(i32),
    /// Advertising data or parameters were rejected.
    Configure(i32),
    /// Advertising could not be started.
    Start(i32),
    /// Advertising could not be stopped.
    Stop(i32),
    /// The stack was used before `enable()` succeeded.
    NotEnabled,
    /// The advertising data block does not fit a legacy PDU.
    PayloadTooLarge,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackInit(rc) => write!(f, "BLE stack init failed (rc={rc})"),
            Self::Configure(rc) => write!(f, "advertising config rejected (rc={rc})"),
            Self::Start(rc) => write!(f, "advertising start failed (rc={rc})"),
            Self::Stop(rc) => write!(f, "advertising stop failed (rc={rc})"),
            Self::NotEnabled => write!(f, "BLE stack not enabled"),
            Self::PayloadTooLarge => write!(f, "advertising data exceeds 31 bytes"),
        }
    }
}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

/// Failures from the companion rail and done-signal pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// Level read failed.
    Read(i32),
    /// Level write failed.
    Write(i32),
    /// Interrupt handler could not be attached.
    IsrAdd(i32),
    /// Interrupt handler could not be detached.
    IsrRemove(i32),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(rc) => write!(f, "GPIO read failed (rc={rc})"),
            Self::Write(rc) => write!(f, "GPIO write failed (rc={rc})"),
            Self::IsrAdd(rc) => write!(f, "GPIO ISR registration failed (rc={rc})"),
            Self::IsrRemove(rc) => write!(f, "GPIO ISR removal failed (rc={rc})"),
        }
    }
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Rejected [`BeaconConfig`](crate::config::BeaconConfig) values.
///
/// The `&'static str` names the offending field and the rule it broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// A JSON override could not be parsed.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Malformed => write!(f, "malformed config JSON"),
        }
    }
}
