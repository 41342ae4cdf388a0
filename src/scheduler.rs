//! Advertising duty-cycle scheduler.
//!
//! Between two companion sessions the radio is off most of the time.  A
//! beacon window is a train of short bursts, each carrying a fresh supply
//! reading:
//!
//! ```text
//!  ┌─ window (sleep interval) ──────────────────────────────────────┐
//!  │ sample │ configure │ start ▐█ burst █▌ stop │ sample │ ...     │
//!  └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The window deadline is only checked between bursts, so a window may
//! overrun its deadline by at most one burst length.

use embassy_time::Duration;
use log::{debug, info, warn};

use crate::advertising::Advertisement;
use crate::app::events::{AppEvent, RadioOp};
use crate::app::ports::{Advertiser, Clock, EventSink, SensorSampler};
use crate::error::RadioError;

// ═══════════════════════════════════════════════════════════════
//  Window report
// ═══════════════════════════════════════════════════════════════

/// Summary of one beacon window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowReport {
    /// Bursts started (sample taken, radio asked to advertise).
    pub bursts: u32,
    /// Radio calls that failed during the window.
    pub radio_faults: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Owns the advertisement and drives the radio through beacon windows.
///
/// The payload is only ever written here, and always before
/// [`Advertiser::configure`] borrows it for the next burst.
pub struct AdvertisementScheduler {
    advertisement: Advertisement,
}

impl AdvertisementScheduler {
    pub fn new(advertisement: Advertisement) -> Self {
        Self { advertisement }
    }

    pub fn advertisement(&self) -> &Advertisement {
        &self.advertisement
    }

    /// Run bursts of `burst` length until `window` has elapsed.
    ///
    /// Radio failures are reported to `sink` and counted; they never end
    /// the window early.
    pub fn run_window<Sm, A, C, E>(
        &mut self,
        sampler: &mut Sm,
        radio: &mut A,
        clock: &mut C,
        sink: &mut E,
        window: Duration,
        burst: Duration,
    ) -> WindowReport
    where
        Sm: SensorSampler,
        A: Advertiser,
        C: Clock,
        E: EventSink,
    {
        let deadline = clock.now() + window;
        let mut report = WindowReport::default();
        info!(
            "beacon: window of {}s, {}s bursts",
            window.as_secs(),
            burst.as_secs()
        );

        while clock.now() < deadline {
            let reading = sampler.sample();
            self.advertisement.set_reading(reading);
            sink.emit(&AppEvent::Burst(reading));
            debug!(
                "beacon: burst {} battery={}mV supply={}mV",
                report.bursts, reading.battery_mv, reading.supply_mv
            );

            let configured = radio.configure(&self.advertisement);
            record(&mut report, sink, RadioOp::Configure, configured);
            let started = radio.start();
            record(&mut report, sink, RadioOp::Start, started);

            clock.sleep(burst);

            let stopped = radio.stop();
            record(&mut report, sink, RadioOp::Stop, stopped);
            report.bursts += 1;
        }

        info!(
            "beacon: window done, {} bursts, {} radio faults",
            report.bursts, report.radio_faults
        );
        report
    }
}

fn record<E: EventSink>(report: &mut WindowReport, sink: &mut E, op: RadioOp, result: Result<(), RadioError>) {
    if let Err(error) = result {
        warn!("beacon: radio {:?} failed: {}", op, error);
        report.radio_faults += 1;
        sink.emit(&AppEvent::RadioFault { op, error });
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
