//! Companion done-signal input.
//!
//! Active-low line with the internal pull-up enabled, so an unpowered or
//! disconnected companion reads HIGH (not done).  Falling edges are
//! captured by a GPIO ISR into the shared [`EdgeQueue`] while armed.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the GPIO and (de)registers the ISR via hw_init.
//! On host/test: level injected with [`sim_set_done_low`]; arming goes
//! through the host ISR registry in hw_init.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorType, InputPin};

use crate::app::ports::EdgeSignal;
use crate::drivers::hw_init;
use crate::error::GpioError;
use crate::events::EdgeQueue;
use crate::pins;

static SIM_DONE_LOW: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_done_low(low: bool) {
    SIM_DONE_LOW.store(low, Ordering::Relaxed);
}

/// The done-signal line.  `armed` means the last arm completed.
pub struct DoneSignal {
    pin: i32,
    armed: bool,
}

impl Default for DoneSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl DoneSignal {
    pub fn new() -> Self {
        Self::on_pin(pins::DONE_SIGNAL_GPIO)
    }

    pub fn on_pin(pin: i32) -> Self {
        Self { pin, armed: false }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    #[cfg(target_os = "espidf")]
    fn read_low(&self) -> bool {
        !hw_init::gpio_read(self.pin)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_low(&self) -> bool {
        SIM_DONE_LOW.load(Ordering::Relaxed)
    }
}

impl ErrorType for DoneSignal {
    type Error = GpioError;
}

impl InputPin for DoneSignal {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read_low())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read_low())
    }
}

impl EdgeSignal for DoneSignal {
    fn arm_falling_edge(&mut self, queue: &'static EdgeQueue) -> Result<(), Self::Error> {
        if self.armed {
            return Ok(());
        }
        hw_init::arm_falling_edge(self.pin, queue).map_err(GpioError::IsrAdd)?;
        self.armed = true;
        Ok(())
    }

    /// Always runs the hardware teardown, even when not marked armed, so a
    /// half-completed arm is still released.
    fn disarm(&mut self) -> Result<(), Self::Error> {
        self.armed = false;
        hw_init::disarm(self.pin).map_err(GpioError::IsrRemove)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::edge_queue;

    static QUEUE: EdgeQueue = edge_queue();

    #[test]
    fn arm_and_disarm_are_idempotent() {
        let mut done = DoneSignal::new();
        done.disarm().unwrap();
        assert!(!done.is_armed());
        done.arm_falling_edge(&QUEUE).unwrap();
        done.arm_falling_edge(&QUEUE).unwrap();
        assert!(done.is_armed());
        done.disarm().unwrap();
        assert!(!done.is_armed());
    }

    #[test]
    fn failed_arm_is_still_released_by_disarm() {
        const PIN: i32 = 42;
        let mut done = DoneSignal::on_pin(PIN);
        hw_init::sim_fail_intr_enable(PIN, true);

        assert_eq!(done.arm_falling_edge(&QUEUE), Err(GpioError::IsrAdd(-1)));
        assert!(!done.is_armed());
        assert!(!hw_init::sim_handler_registered(PIN));

        hw_init::sim_fail_intr_enable(PIN, false);
        done.arm_falling_edge(&QUEUE).unwrap();
        assert!(hw_init::sim_handler_registered(PIN));
        done.disarm().unwrap();
        assert!(!hw_init::sim_handler_registered(PIN));
    }

    #[test]
    fn level_follows_injected_line() {
        let mut done = DoneSignal::new();
        sim_set_done_low(true);
        assert_eq!(done.is_low(), Ok(true));
        sim_set_done_low(false);
        assert_eq!(done.is_high(), Ok(true));
    }
}
