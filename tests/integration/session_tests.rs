//! Companion session end-to-end: rail → settle → validator → cleanup.

use std::panic::{self, AssertUnwindSafe};

use athene::app::ports::Clock;
use athene::config::{BeaconConfig, SessionTiming};
use athene::session::{run_session, ValidationOutcome};
use athene::sim::{SimClock, SimWorld};
use embassy_time::{Duration, Instant};

fn default_timing() -> SessionTiming {
    BeaconConfig::default().session_timing()
}

fn compressed_timing() -> SessionTiming {
    BeaconConfig {
        settle_delay_ms: 50,
        validation_window_ms: 100,
        session_timeout_secs: 2,
        poll_interval_ms: 200,
        edge_settle_ms: 5,
        sample_interval_ms: 5,
        ..BeaconConfig::default()
    }
    .session_timing()
}

#[test]
fn done_pulse_at_ten_seconds_confirms_around_eleven() {
    let world = SimWorld::new();
    let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());
    world.schedule_low(Duration::from_secs(10), Duration::from_millis(1_200));

    let result = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &default_timing());

    assert_eq!(result.outcome, ValidationOutcome::Confirmed);
    let t = world.elapsed();
    assert!(t >= Duration::from_secs(11) && t < Duration::from_millis(11_100), "{t:?}");
    // Rail dropped at the moment of confirmation, not later.
    assert_eq!(world.rail_log().last(), Some(&(world.now(), false)));
}

#[test]
fn silent_companion_times_out_after_full_timeout() {
    let world = SimWorld::new();
    let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());

    let result = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &default_timing());

    assert_eq!(result.outcome, ValidationOutcome::TimedOut);
    assert_eq!(world.elapsed(), Duration::from_secs(5 + 120));
    assert!(!world.rail_high());
    assert!(!world.signal_armed());
}

#[test]
fn compressed_timing_confirms_quickly() {
    let world = SimWorld::new();
    let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());
    world.schedule_low(Duration::from_millis(450), Duration::from_secs(1));

    let result = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &compressed_timing());

    assert!(result.confirmed());
    assert_eq!(result.elapsed, Duration::from_millis(555));
}

#[test]
fn leftover_edge_from_previous_session_is_ignored() {
    let world = SimWorld::new();
    let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());
    world.schedule_low(Duration::from_millis(450), Duration::from_millis(150));

    let first = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &compressed_timing());
    assert!(first.confirmed());

    // Shutdown chatter after the observer was released.
    world.inject_stale_edge();
    let second = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &compressed_timing());

    assert_eq!(second.outcome, ValidationOutcome::TimedOut);
    assert_eq!(second.rejected_attempts, 0);
    assert_eq!((world.arm_count(), world.disarm_count()), (2, 2));
}

#[test]
fn repeated_bounces_are_counted() {
    let world = SimWorld::new();
    let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());
    // Three short dips, each caught by a separate coarse poll.
    for start_ms in [250, 650, 1_050] {
        world.schedule_low(Duration::from_millis(start_ms), Duration::from_millis(40));
    }

    let result = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &compressed_timing());

    assert_eq!(result.outcome, ValidationOutcome::TimedOut);
    assert_eq!(result.rejected_attempts, 3);
}

/// Clock that panics after a number of sleeps, to exercise unwinding.
struct FaultyClock {
    inner: SimClock,
    sleeps_left: u32,
}

impl Clock for FaultyClock {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    fn sleep(&mut self, duration: Duration) {
        if self.sleeps_left == 0 {
            panic!("clock fault");
        }
        self.sleeps_left -= 1;
        self.inner.sleep(duration);
    }
}

#[test]
fn rail_is_cut_even_when_the_session_unwinds() {
    let world = SimWorld::new();
    let (mut rail, mut signal) = (world.rail(), world.signal());
    let mut clock = FaultyClock { inner: world.clock(), sleeps_left: 3 };
    let queue = world.queue();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_session(&mut rail, &mut signal, queue, &mut clock, &default_timing())
    }));

    assert!(outcome.is_err());
    assert!(!world.rail_high());
    assert!(!world.signal_armed());
}
