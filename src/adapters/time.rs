//! System clock adapter.
//!
//! Implements [`Clock`] for the real firmware.
//!
//! - **`target_os = "espidf"`** — `embassy_time::Instant::now()`, backed by
//!   `esp_timer_get_time()` through the link shim (microsecond precision,
//!   monotonic).
//! - **`not(target_os = "espidf")`** — offsets from a `std::time::Instant`
//!   taken at construction, for running the service on a desktop.
//!
//! Sleeping is `std::thread::sleep` on both; on ESP-IDF that is a FreeRTOS
//! task delay, so the idle task (and light sleep, if enabled) gets the CPU.

use embassy_time::{Duration, Instant};

use crate::app::ports::Clock;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    #[cfg(target_os = "espidf")]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[cfg(not(target_os = "espidf"))]
    fn now(&self) -> Instant {
        Instant::from_micros(self.start.elapsed().as_micros() as u64)
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(core::time::Duration::from_micros(duration.as_micros()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_moves_now_forward() {
        let mut clock = SystemClock::new();
        let before = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now().saturating_duration_since(before) >= Duration::from_millis(5));
    }
}
