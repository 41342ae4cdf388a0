//! GPIO / peripheral pin assignments for the Athene timer board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Companion module
// ---------------------------------------------------------------------------

/// Digital output: companion power rail enable (load switch, active HIGH).
pub const COMPANION_RAIL_GPIO: i32 = 4;

/// Digital input, pull-up: companion "done" line.  The companion drives it
/// LOW when it has finished and may be powered down.
pub const DONE_SIGNAL_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Supply sensing — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Battery divider tap.  ADC1 channel 6 (GPIO 34).
pub const BATTERY_ADC_CHANNEL: u32 = 6;

/// Charger / solar input divider tap.  ADC1 channel 7 (GPIO 35).
pub const SUPPLY_ADC_CHANNEL: u32 = 7;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board LED, active LOW.  Lit once at boot as a power-on indicator.
pub const STATUS_LED_GPIO: i32 = 2;
