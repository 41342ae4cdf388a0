//! Application service — the beacon's main loop.
//!
//! [`BeaconService`] owns the configuration, the advertisement scheduler
//! and every port.  It alternates forever between two states:
//!
//! ```text
//!          ┌───────────────┐   session returned    ┌───────────────┐
//!  start ─▶│    Session    │──────────────────────▶│    Beacon     │
//!          │ rail + done   │◀──────────────────────│ burst window  │
//!          └───────────────┘   window deadline     └───────────────┘
//! ```
//!
//! Neither transition depends on how the previous state went: a timed-out
//! session and a window full of radio faults are both followed by the
//! next state as usual.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::advertising::Advertisement;
use crate::config::{BeaconConfig, SessionTiming};
use crate::events::EdgeQueue;
use crate::scheduler::AdvertisementScheduler;
use crate::session;

use super::events::{AppEvent, RadioOp};
use super::ports::{Advertiser, Clock, EdgeSignal, EventSink, SensorSampler};

// ───────────────────────────────────────────────────────────────
// Loop state
// ───────────────────────────────────────────────────────────────

/// The two states of the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Power the companion and wait for its done signal.
    Session,
    /// Advertise supply readings until the sleep interval has elapsed.
    Beacon,
}

impl LoopState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Session => "Session",
            Self::Beacon => "Beacon",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Session => Self::Beacon,
            Self::Beacon => Self::Session,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Ports bundle
// ───────────────────────────────────────────────────────────────

/// Everything the service drives.
pub struct BeaconPorts<R, S, Sm, A, C, E> {
    /// Companion power rail (active high).
    pub rail: R,
    /// Companion done line (active low, falling-edge capable).
    pub signal: S,
    pub sampler: Sm,
    pub radio: A,
    pub clock: C,
    pub sink: E,
}

// ───────────────────────────────────────────────────────────────
// BeaconService
// ───────────────────────────────────────────────────────────────

pub struct BeaconService<R, S, Sm, A, C, E> {
    config: BeaconConfig,
    session_timing: SessionTiming,
    scheduler: AdvertisementScheduler,
    ports: BeaconPorts<R, S, Sm, A, C, E>,
    queue: &'static EdgeQueue,
    state: LoopState,
}

impl<R, S, Sm, A, C, E> BeaconService<R, S, Sm, A, C, E>
where
    R: OutputPin,
    S: EdgeSignal,
    Sm: SensorSampler,
    A: Advertiser,
    C: Clock,
    E: EventSink,
{
    /// Build the service.  Does not touch the radio; call [`start`](Self::start).
    pub fn new(config: BeaconConfig, ports: BeaconPorts<R, S, Sm, A, C, E>, queue: &'static EdgeQueue) -> Self {
        let session_timing = config.session_timing();
        let scheduler = AdvertisementScheduler::new(Advertisement::from_config(&config));
        Self {
            config,
            session_timing,
            scheduler,
            ports,
            queue,
            state: LoopState::Session,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the radio stack up.  A failure is reported and ignored; the
    /// bursts will keep failing but sessions still run.
    pub fn start(&mut self) {
        if let Err(error) = self.ports.radio.enable() {
            warn!("service: radio enable failed: {}", error);
            self.ports.sink.emit(&AppEvent::RadioFault { op: RadioOp::Enable, error });
        }
        info!("service: started in {} state", self.state.name());
        self.ports.sink.emit(&AppEvent::Started);
    }

    /// Run the current state to completion and move to the next one.
    /// Returns the new state.
    pub fn step(&mut self) -> LoopState {
        let from = self.state;
        match from {
            LoopState::Session => self.run_session_state(),
            LoopState::Beacon => self.run_beacon_state(),
        }
        let to = from.next();
        self.state = to;
        self.ports.sink.emit(&AppEvent::StateChanged { from, to });
        to
    }

    /// Step forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn scheduler(&self) -> &AdvertisementScheduler {
        &self.scheduler
    }

    // ── States ────────────────────────────────────────────────

    fn run_session_state(&mut self) {
        if let Some(min_mv) = self.config.min_session_battery_mv {
            let battery_mv = self.ports.sampler.sample().battery_mv;
            if battery_mv < min_mv {
                warn!(
                    "service: battery {}mV below {}mV, skipping companion session",
                    battery_mv, min_mv
                );
                self.ports.sink.emit(&AppEvent::SessionSkipped { battery_mv });
                return;
            }
        }

        self.ports.sink.emit(&AppEvent::SessionStarted);
        let p = &mut self.ports;
        let result = session::run_session(&mut p.rail, &mut p.signal, self.queue, &mut p.clock, &self.session_timing);
        p.sink.emit(&AppEvent::SessionFinished(result));
    }

    fn run_beacon_state(&mut self) {
        let window = self.config.sleep_interval();
        let burst = self.config.burst_length();
        let p = &mut self.ports;
        let report = self
            .scheduler
            .run_window(&mut p.sampler, &mut p.radio, &mut p.clock, &mut p.sink, window, burst);
        p.sink.emit(&AppEvent::WindowFinished {
            bursts: report.bursts,
            radio_faults: report.radio_faults,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{CompanionScript, SimClock, SimRadio, SimRail, SimSampler, SimSignal, RecordingSink, SimWorld};

    type SimService = BeaconService<SimRail, SimSignal, SimSampler, SimRadio, SimClock, RecordingSink>;

    fn service(world: &SimWorld, config: BeaconConfig) -> SimService {
        let ports = BeaconPorts {
            rail: world.rail(),
            signal: world.signal(),
            sampler: world.sampler(),
            radio: world.radio(),
            clock: world.clock(),
            sink: world.sink(),
        };
        BeaconService::new(config, ports, world.queue())
    }

    #[test]
    fn starts_in_session_and_alternates() {
        let world = SimWorld::new();
        let mut svc = service(&world, BeaconConfig::default());
        svc.start();

        assert_eq!(svc.state(), LoopState::Session);
        assert_eq!(svc.step(), LoopState::Beacon);
        assert_eq!(svc.step(), LoopState::Session);
        assert_eq!(svc.step(), LoopState::Beacon);
    }

    #[test]
    fn beacon_window_leaves_the_last_reading_in_the_payload() {
        let world = SimWorld::new();
        let reading = crate::sensors::SupplyReading { battery_mv: 3_700, supply_mv: 4_950 };
        world.set_reading(reading);
        let mut svc = service(&world, BeaconConfig::default());
        svc.start();
        svc.step();
        svc.step();

        assert_eq!(svc.scheduler().advertisement().payload().reading(), reading);
    }

    #[test]
    fn low_battery_skips_the_companion() {
        let world = SimWorld::new();
        world.set_reading(crate::sensors::SupplyReading { battery_mv: 3_100, supply_mv: 0 });
        let config = BeaconConfig {
            min_session_battery_mv: Some(3_300),
            ..BeaconConfig::default()
        };
        let mut svc = service(&world, config);

        assert_eq!(svc.step(), LoopState::Beacon);
        assert!(world.rail_log().is_empty());
        assert_eq!(world.elapsed().as_ticks(), 0);
        assert!(world.events().contains(&AppEvent::SessionSkipped { battery_mv: 3_100 }));
    }

    #[test]
    fn enable_failure_is_reported_and_loop_continues() {
        let world = SimWorld::new();
        world.fail_radio(RadioOp::Enable);
        world.set_companion(Some(CompanionScript {
            done_after: embassy_time::Duration::from_secs(20),
            hold_low: embassy_time::Duration::from_secs(60),
        }));
        let mut svc = service(&world, BeaconConfig::default());
        svc.start();
        svc.step();

        let events = world.events();
        assert!(matches!(events[0], AppEvent::RadioFault { op: RadioOp::Enable, .. }));
        assert_eq!(events[1], AppEvent::Started);
        assert!(matches!(events[3], AppEvent::SessionFinished(r) if r.confirmed()));
    }
}
