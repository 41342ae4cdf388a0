//! Simulated hardware harness for integration tests.
//!
//! Wires every port of a [`BeaconService`] to one [`SimWorld`] so tests
//! can script the companion and assert on the full rail / radio history.

use athene::app::events::AppEvent;
use athene::app::service::{BeaconPorts, BeaconService};
use athene::config::BeaconConfig;
use athene::sim::{RecordingSink, SimClock, SimRadio, SimRail, SimSampler, SimSignal, SimWorld};
use embassy_time::Duration;

pub type SimService = BeaconService<SimRail, SimSignal, SimSampler, SimRadio, SimClock, RecordingSink>;

pub fn make_service(world: &SimWorld, config: BeaconConfig) -> SimService {
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

/// Rail on/off pairs as offsets from world creation.
#[allow(dead_code)]
pub fn rail_sessions(world: &SimWorld) -> Vec<(Duration, Duration)> {
    let origin = world.at(Duration::from_secs(0));
    world
        .rail_log()
        .chunks(2)
        .filter_map(|pair| match pair {
            [(on, true), (off, false)] => Some((*on - origin, *off - origin)),
            _ => None,
        })
        .collect()
}

#[allow(dead_code)]
pub fn count_events(world: &SimWorld, pred: impl Fn(&AppEvent) -> bool) -> usize {
    world.events().iter().filter(|e| pred(e)).count()
}
