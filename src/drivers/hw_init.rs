//! One-shot hardware peripheral initialization and raw register helpers.
//!
//! Configures ADC1, the companion rail output, the done-signal input and
//! the status LED using raw ESP-IDF sys calls.  Called once from `main()`
//! before the service starts.  The typed drivers in this module's
//! siblings are thin wrappers over the helpers below.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the service starts; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

/// Conversion width configured on both supply channels.
pub const ADC_BITS: u32 = 12;

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the service
/// starts sampling.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 12 dB attenuation: the divider taps span roughly 0 – 3.1 V.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [pins::BATTERY_ADC_CHANNEL, pins::SUPPLY_ADC_CHANNEL] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=battery, CH{}=supply)",
        pins::BATTERY_ADC_CHANNEL, pins::SUPPLY_ADC_CHANNEL
    );
    Ok(())
}

/// Raw `ADC_BITS`-wide conversion.  A failed read returns 0.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract — single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        log::warn!("hw_init: ADC1 CH{} read failed (rc={})", channel, ret);
        return 0;
    }
    raw.max(0) as u16
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio() -> Result<(), HwInitError> {
    // Done line: pull-up input.  The interrupt type is set when armed.
    let done_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::DONE_SIGNAL_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&done_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    // Rail starts off, LED (active low) starts dark.
    for (pin, idle_level) in [(pins::COMPANION_RAIL_GPIO, 0), (pins::STATUS_LED_GPIO, 1)] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, idle_level) };
    }

    info!("hw_init: GPIO configured (rail, done, LED)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_gpio(). Main-loop only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(ret);
    }
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::events::{push_edge, EdgeQueue};

#[cfg(target_os = "espidf")]
unsafe extern "C" fn done_signal_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static EdgeQueue` registered in
    // arm_falling_edge(); it outlives every interrupt.
    let queue = unsafe { &*(arg as *const EdgeQueue) };
    // SAFETY: esp_timer_get_time is a timer counter read; safe in ISR context.
    let now_us = unsafe { esp_timer_get_time() } as u64;
    // A full queue drops the edge; the pending ones already wake the validator.
    let _ = push_edge(queue, embassy_time::Instant::from_micros(now_us));
}

/// Install the per-pin GPIO ISR service.
/// Call after init_peripherals() and before the first session.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HwInitError::IsrInstallFailed(ret));
    }
    info!("hw_init: ISR service installed");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

/// Route falling edges on `pin` into `queue`.
///
/// A failure after the handler was added removes it again, so an `Err`
/// never leaves a half-armed pin behind.
#[cfg(target_os = "espidf")]
pub fn arm_falling_edge(pin: i32, queue: &'static EdgeQueue) -> Result<(), i32> {
    // SAFETY: the handler only pushes into the lock-free-from-ISR queue;
    // the queue pointer is 'static.
    unsafe {
        let ret = gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        if ret != ESP_OK as i32 { return Err(ret); }
        let arg = queue as *const EdgeQueue as *mut core::ffi::c_void;
        let ret = gpio_isr_handler_add(pin, Some(done_signal_isr), arg);
        if ret != ESP_OK as i32 { return Err(ret); }
        let ret = gpio_intr_enable(pin);
        if ret != ESP_OK as i32 {
            if let Err(rc) = disarm(pin) {
                log::warn!("hw_init: GPIO{} rollback after failed enable (rc={})", pin, rc);
            }
            return Err(ret);
        }
    }
    Ok(())
}

/// Stop routing edges from `pin`.
///
/// Both the disable and the handler removal are always attempted; the
/// first failure is reported.
#[cfg(target_os = "espidf")]
pub fn disarm(pin: i32) -> Result<(), i32> {
    // SAFETY: disabling and removing an unregistered handler is reported
    // through the return code only.
    let disable = unsafe { gpio_intr_disable(pin) };
    // SAFETY: as above.
    let remove = unsafe { gpio_isr_handler_remove(pin) };
    for ret in [disable, remove] {
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
    }
    Ok(())
}

// ── Host ISR registry ─────────────────────────────────────────
//
// Tracks which pins have a handler registered, with an injectable
// interrupt-enable failure, so the arm/rollback/teardown sequence above
// can be exercised off-target.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(target_os = "espidf"))]
static SIM_HANDLERS: AtomicU64 = AtomicU64::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_ENABLE_FAULTS: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
fn pin_bit(pin: i32) -> u64 {
    1u64 << (pin as u32 % 64)
}

/// Make `gpio_intr_enable` fail for `pin` until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_intr_enable(pin: i32, fail: bool) {
    if fail {
        SIM_ENABLE_FAULTS.fetch_or(pin_bit(pin), Ordering::Relaxed);
    } else {
        SIM_ENABLE_FAULTS.fetch_and(!pin_bit(pin), Ordering::Relaxed);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_handler_registered(pin: i32) -> bool {
    SIM_HANDLERS.load(Ordering::Relaxed) & pin_bit(pin) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn arm_falling_edge(pin: i32, _queue: &'static crate::events::EdgeQueue) -> Result<(), i32> {
    SIM_HANDLERS.fetch_or(pin_bit(pin), Ordering::Relaxed);
    if SIM_ENABLE_FAULTS.load(Ordering::Relaxed) & pin_bit(pin) != 0 {
        disarm(pin)?;
        return Err(-1);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn disarm(pin: i32) -> Result<(), i32> {
    SIM_HANDLERS.fetch_and(!pin_bit(pin), Ordering::Relaxed);
    Ok(())
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::events::{edge_queue, EdgeQueue};

    static QUEUE: EdgeQueue = edge_queue();

    #[test]
    fn failed_enable_removes_the_handler_again() {
        const PIN: i32 = 40;
        sim_fail_intr_enable(PIN, true);
        assert_eq!(arm_falling_edge(PIN, &QUEUE), Err(-1));
        assert!(!sim_handler_registered(PIN));
        sim_fail_intr_enable(PIN, false);
    }

    #[test]
    fn arm_then_disarm_releases_the_handler() {
        const PIN: i32 = 41;
        arm_falling_edge(PIN, &QUEUE).unwrap();
        assert!(sim_handler_registered(PIN));
        disarm(PIN).unwrap();
        assert!(!sim_handler_registered(PIN));
    }
}
