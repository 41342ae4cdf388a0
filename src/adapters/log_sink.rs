//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Records are one
//! line each, tagged so a serial capture can be grepped per concern.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | beacon service up");
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::SessionStarted => {
                info!("SESSION | companion powered");
            }
            AppEvent::SessionFinished(r) => {
                info!(
                    "SESSION | outcome={:?} | elapsed={}ms | rejected={}",
                    r.outcome,
                    r.elapsed.as_millis(),
                    r.rejected_attempts
                );
            }
            AppEvent::SessionSkipped { battery_mv } => {
                warn!("SESSION | skipped | battery={}mV", battery_mv);
            }
            AppEvent::Burst(r) => {
                info!("BURST | battery={}mV | supply={}mV", r.battery_mv, r.supply_mv);
            }
            AppEvent::RadioFault { op, error } => {
                warn!("RADIO | {:?} failed | {}", op, error);
            }
            AppEvent::WindowFinished { bursts, radio_faults } => {
                info!("WINDOW | bursts={} | radio_faults={}", bursts, radio_faults);
            }
        }
    }
}
