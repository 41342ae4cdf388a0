//! GPIO drivers and hardware initialisation.

pub mod done_signal;
pub mod hw_init;
pub mod rail;
pub mod status_led;
