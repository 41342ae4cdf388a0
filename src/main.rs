//! Athene Timer Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single blocking control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  CompanionRail   DoneSignal      AdcSupplySampler  SystemClock │
//! │  (OutputPin)     (EdgeSignal)    (SensorSampler)   (Clock)     │
//! │  BleAdvertiser   LogEventSink                                  │
//! │  (Advertiser)    (EventSink)                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            BeaconService (pure logic)                  │    │
//! │  │  Session (rail · validator) ⇄ Beacon (scheduler)       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GPIO ISR ──▶ EDGE_QUEUE ──▶ validator                         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{anyhow, Result};
use embassy_time::Duration;
use log::info;

use athene::adapters::ble::BleAdvertiser;
use athene::adapters::log_sink::LogEventSink;
use athene::adapters::time::SystemClock;
use athene::app::ports::Clock;
use athene::app::service::{BeaconPorts, BeaconService};
use athene::config::BeaconConfig;
use athene::drivers::done_signal::DoneSignal;
use athene::drivers::hw_init;
use athene::drivers::rail::CompanionRail;
use athene::drivers::status_led::StatusLed;
use athene::events::{edge_queue, EdgeQueue};
use athene::sensors::supply::AdcSupplySampler;

/// Falling edges from the done-signal ISR.  The only `'static` state.
static EDGE_QUEUE: EdgeQueue = edge_queue();

// ── Configuration ─────────────────────────────────────────────

/// Defaults, optionally overridden by a JSON document baked in with
/// `ATHENE_CONFIG_JSON=... cargo build`.
fn load_config() -> Result<BeaconConfig> {
    let config = match option_env!("ATHENE_CONFIG_JSON") {
        Some(json) => {
            info!("config: applying build-time override");
            BeaconConfig::from_json(json).map_err(|e| anyhow!("ATHENE_CONFIG_JSON: {}", e))?
        }
        None => BeaconConfig::default(),
    };
    config.validate().map_err(|e| anyhow!("config: {}", e))?;
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Athene timer v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config()?;
    info!(
        "config: session timeout {}s, window {}ms, sleep {}s, burst {}s, name '{}'",
        config.session_timeout_secs,
        config.validation_window_ms,
        config.sleep_interval_secs,
        config.burst_length_secs,
        config.local_name
    );

    // ── 3. Hardware ───────────────────────────────────────────
    hw_init::init_peripherals().map_err(|e| anyhow!("HAL init: {}", e))?;
    hw_init::init_isr_service().map_err(|e| anyhow!("ISR service: {}", e))?;

    let mut clock = SystemClock::new();

    // Power-on indicator before the companion is first energized.
    let mut led = StatusLed::new();
    led.on();
    clock.sleep(Duration::from_millis(config.boot_indicator_ms.into()));
    led.off();

    // ── 4. Service ────────────────────────────────────────────
    let ports = BeaconPorts {
        rail: CompanionRail::new(),
        signal: DoneSignal::new(),
        sampler: AdcSupplySampler::new(config.adc_reference_mv),
        radio: BleAdvertiser::new(),
        clock,
        sink: LogEventSink::new(),
    };
    let mut service = BeaconService::new(config, ports, &EDGE_QUEUE);
    service.start();

    // ── 5. Main loop (never returns) ──────────────────────────
    service.run()
}
