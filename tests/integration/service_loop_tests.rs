//! Main loop: Session ⇄ Beacon alternation against the simulated world.

use athene::app::events::{AppEvent, RadioOp};
use athene::app::service::LoopState;
use athene::config::BeaconConfig;
use athene::sensors::SupplyReading;
use athene::session::ValidationOutcome;
use athene::sim::{CompanionScript, RadioCall, SimWorld};
use embassy_time::Duration;

use crate::mock_hw::{count_events, make_service, rail_sessions};

fn responsive_companion(world: &SimWorld) {
    world.set_companion(Some(CompanionScript {
        done_after: Duration::from_secs(20),
        hold_low: Duration::from_secs(60),
    }));
}

#[test]
fn loop_alternates_session_and_beacon() {
    let world = SimWorld::new();
    responsive_companion(&world);
    let mut svc = make_service(&world, BeaconConfig::default());
    svc.start();

    let states: Vec<LoopState> = (0..4).map(|_| svc.step()).collect();
    assert_eq!(
        states,
        vec![LoopState::Beacon, LoopState::Session, LoopState::Beacon, LoopState::Session]
    );

    // Done pulse at 20 s is seen by the 20 s poll, confirmed 1.01 s later.
    let sessions = rail_sessions(&world);
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0], (Duration::from_secs(0), Duration::from_millis(21_010)));
    let second_on = Duration::from_millis(21_010) + Duration::from_secs(30 * 60);
    assert_eq!(sessions[1].0, second_on);
    assert!(!world.rail_high());
}

#[test]
fn event_stream_follows_loop_order() {
    let world = SimWorld::new();
    responsive_companion(&world);
    world.set_reading(SupplyReading { battery_mv: 3_950, supply_mv: 5_020 });
    let mut svc = make_service(&world, BeaconConfig::default());
    svc.start();
    svc.step();
    svc.step();

    let events = world.events();
    assert_eq!(events[0], AppEvent::Started);
    assert_eq!(events[1], AppEvent::SessionStarted);
    assert!(matches!(
        events[2],
        AppEvent::SessionFinished(r) if r.outcome == ValidationOutcome::Confirmed
    ));
    assert_eq!(
        events[3],
        AppEvent::StateChanged { from: LoopState::Session, to: LoopState::Beacon }
    );
    assert_eq!(events[4], AppEvent::Burst(SupplyReading { battery_mv: 3_950, supply_mv: 5_020 }));
    assert_eq!(
        events[events.len() - 2],
        AppEvent::WindowFinished { bursts: 60, radio_faults: 0 }
    );
    assert_eq!(
        events[events.len() - 1],
        AppEvent::StateChanged { from: LoopState::Beacon, to: LoopState::Session }
    );
}

#[test]
fn silent_companion_does_not_stall_the_loop() {
    let world = SimWorld::new();
    let mut svc = make_service(&world, BeaconConfig::default());
    svc.start();

    assert_eq!(svc.step(), LoopState::Beacon);
    assert_eq!(svc.step(), LoopState::Session);

    let timed_out = count_events(&world, |e| {
        matches!(e, AppEvent::SessionFinished(r) if r.outcome == ValidationOutcome::TimedOut)
    });
    assert_eq!(timed_out, 1);
    assert_eq!(world.elapsed(), Duration::from_secs(125 + 30 * 60));
}

#[test]
fn dead_radio_never_stops_the_loop() {
    let world = SimWorld::new();
    responsive_companion(&world);
    for op in [RadioOp::Enable, RadioOp::Configure, RadioOp::Start, RadioOp::Stop] {
        world.fail_radio(op);
    }
    let mut svc = make_service(&world, BeaconConfig::default());
    svc.start();

    for _ in 0..6 {
        svc.step();
    }

    assert_eq!(svc.state(), LoopState::Session);
    assert_eq!(rail_sessions(&world).len(), 3);
    assert!(world.radio_log().is_empty());
    let windows = count_events(&world, |e| {
        matches!(e, AppEvent::WindowFinished { bursts: 60, radio_faults: 180 })
    });
    assert_eq!(windows, 3);
}

#[test]
fn every_burst_starts_with_a_fresh_sample() {
    let world = SimWorld::new();
    responsive_companion(&world);
    let config = BeaconConfig {
        sleep_interval_secs: 90,
        ..BeaconConfig::default()
    };
    let mut svc = make_service(&world, config);
    svc.start();
    svc.step();
    svc.step();

    assert_eq!(world.sample_count(), 3);
    let calls: Vec<RadioCall> = world.radio_log().into_iter().map(|(_, c)| c).collect();
    assert_eq!(calls[0], RadioCall::Enable);
    assert_eq!(calls.len(), 1 + 3 * 3);
    assert!(calls[1..].chunks(3).all(|c| matches!(c, [RadioCall::Configure(_), RadioCall::Start, RadioCall::Stop])));
}
