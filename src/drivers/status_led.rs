//! Status LED driver.
//!
//! Single active-low LED on [`pins::STATUS_LED_GPIO`].  The firmware only
//! uses it as a power-on indicator before the first session.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO via hw_init.
//! On host/test: tracks state in-memory only.

use crate::pins;

pub struct StatusLed {
    lit: bool,
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLed {
    pub fn new() -> Self {
        Self { lit: false }
    }

    pub fn on(&mut self) {
        self.set(true);
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    #[cfg(target_os = "espidf")]
    fn set(&mut self, lit: bool) {
        // Active low.
        if let Err(rc) = crate::drivers::hw_init::gpio_write(pins::STATUS_LED_GPIO, !lit) {
            log::warn!("status_led: write failed (rc={})", rc);
            return;
        }
        self.lit = lit;
    }

    #[cfg(not(target_os = "espidf"))]
    fn set(&mut self, lit: bool) {
        log::trace!("status_led(sim): GPIO{} lit={}", pins::STATUS_LED_GPIO, lit);
        self.lit = lit;
    }
}
