//! ESP-IDF runtime symbol providers for third-party crates.
//!
//! `embassy-time` reads the clock through `_embassy_time_now`; the
//! firmware only ever reads time (sleeping is a FreeRTOS delay), so no
//! wake scheduler is provided.
//!
//! The critical section behind the edge queue comes from `esp-idf-hal`
//! (interrupt-safe, so the GPIO ISR can push into the queue).

#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_now() -> u64 {
    // SAFETY: esp_timer_get_time reads the high-resolution timer; callable
    // from any context once the system is up.
    unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
}
