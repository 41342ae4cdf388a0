//! Companion power rail driver.
//!
//! A load switch on [`pins::COMPANION_RAIL_GPIO`] powers the companion
//! module; HIGH = powered.  Exposed as an `embedded-hal` [`OutputPin`] so
//! the session code stays hardware-agnostic.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the GPIO via hw_init.
//! On host/test: tracks the level in memory.

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::error::GpioError;
use crate::pins;

pub struct CompanionRail {
    pin: i32,
    powered: bool,
}

impl Default for CompanionRail {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanionRail {
    pub fn new() -> Self {
        Self {
            pin: pins::COMPANION_RAIL_GPIO,
            powered: false,
        }
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        crate::drivers::hw_init::gpio_write(self.pin, high).map_err(GpioError::Write)?;
        self.powered = high;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        log::trace!("rail(sim): GPIO{} -> {}", self.pin, high);
        self.powered = high;
        Ok(())
    }
}

impl ErrorType for CompanionRail {
    type Error = GpioError;
}

impl OutputPin for CompanionRail {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}
