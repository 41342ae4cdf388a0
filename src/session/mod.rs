//! Companion power session.
//!
//! One session energizes the companion over its power rail, gives it time
//! to boot, then waits for its done pulse through the
//! [`SignalValidator`].  However the wait ends, the edge observer is
//! released and the rail is switched off before [`run_session`] returns.
//!
//! ```text
//!   rail ▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔╲__________
//!        │◀ settle ▶│◀──── validation (≤ timeout) ────▶│
//!   done ▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔╲_________________________
//!                                      │◀─ window ─▶│ Confirmed
//! ```

pub mod validator;

use embassy_time::Duration;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::{Clock, EdgeSignal};
use crate::config::SessionTiming;
use crate::events::EdgeQueue;

pub use validator::{SignalValidator, ValidationOutcome, ValidationReport};

/// What one session produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub outcome: ValidationOutcome,
    /// Rail-on to rail-off, settle delay included.
    pub elapsed: Duration,
    /// Edges the validator threw away before the outcome.
    pub rejected_attempts: u32,
}

impl SessionResult {
    pub fn confirmed(&self) -> bool {
        self.outcome == ValidationOutcome::Confirmed
    }
}

/// Rail and edge observer held for the length of a session.
///
/// Dropping it disarms the observer first and then cuts the rail, so the
/// companion can never be left powered and no stray edge from its
/// shutdown reaches the queue.
struct PoweredCompanion<'a, R: OutputPin, S: EdgeSignal> {
    rail: &'a mut R,
    signal: &'a mut S,
}

impl<'a, R: OutputPin, S: EdgeSignal> PoweredCompanion<'a, R, S> {
    fn energize(rail: &'a mut R, signal: &'a mut S) -> Self {
        if let Err(e) = rail.set_high() {
            warn!("session: rail on failed: {:?}", e);
        }
        Self { rail, signal }
    }
}

impl<R: OutputPin, S: EdgeSignal> Drop for PoweredCompanion<'_, R, S> {
    fn drop(&mut self) {
        if let Err(e) = self.signal.disarm() {
            warn!("session: disarming edge observer failed: {:?}", e);
        }
        if let Err(e) = self.rail.set_low() {
            warn!("session: rail off failed: {:?}", e);
        }
    }
}

/// Run one energize / wait-for-done / de-energize cycle.
///
/// Never fails: a companion that stays silent is a
/// [`ValidationOutcome::TimedOut`], not an error.
pub fn run_session<R, S, C>(
    rail: &mut R,
    signal: &mut S,
    queue: &'static EdgeQueue,
    clock: &mut C,
    timing: &SessionTiming,
) -> SessionResult
where
    R: OutputPin,
    S: EdgeSignal,
    C: Clock,
{
    let started = clock.now();
    info!("session: companion on, settling {}ms", timing.settle_delay.as_millis());

    let report = {
        let mut companion = PoweredCompanion::energize(rail, signal);
        clock.sleep(timing.settle_delay);
        SignalValidator::new(timing.validation).await_confirmed_low(&mut *companion.signal, queue, clock)
    };

    let result = SessionResult {
        outcome: report.outcome,
        elapsed: clock.now().saturating_duration_since(started),
        rejected_attempts: report.rejected,
    };
    info!(
        "session: companion off after {}ms ({:?})",
        result.elapsed.as_millis(),
        result.outcome
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeaconConfig;
    use crate::sim::SimWorld;

    fn timing() -> SessionTiming {
        BeaconConfig::default().session_timing()
    }

    #[test]
    fn confirmed_session_powers_down_right_after_window() {
        let world = SimWorld::new();
        let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());
        world.schedule_low(Duration::from_secs(10), Duration::from_millis(1_200));

        let result = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &timing());

        assert!(result.confirmed());
        assert_eq!(result.rejected_attempts, 0);
        let off = result.elapsed;
        assert!(off >= Duration::from_millis(11_000) && off <= Duration::from_millis(11_100), "{off:?}");

        let log = world.rail_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], (world.at(Duration::from_secs(0)), true));
        assert_eq!(log[1], (world.now(), false));
        assert!(!world.signal_armed());
    }

    #[test]
    fn silent_companion_times_out_and_still_powers_down() {
        let world = SimWorld::new();
        let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());

        let result = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &timing());

        assert_eq!(result.outcome, ValidationOutcome::TimedOut);
        assert_eq!(result.elapsed, Duration::from_secs(125));
        assert!(!world.rail_high());
        assert!(!world.signal_armed());
        assert_eq!((world.arm_count(), world.disarm_count()), (1, 1));
    }

    #[test]
    fn read_faults_never_confirm() {
        let world = SimWorld::new();
        let (mut rail, mut signal, mut clock) = (world.rail(), world.signal(), world.clock());
        world.schedule_low(Duration::from_secs(10), Duration::from_secs(5));
        world.set_read_fault(true);

        let result = run_session(&mut rail, &mut signal, world.queue(), &mut clock, &timing());

        assert_eq!(result.outcome, ValidationOutcome::TimedOut);
        assert_eq!(result.rejected_attempts, 1);
        assert!(!world.rail_high());
    }
}
