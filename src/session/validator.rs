//! Done-signal validation.
//!
//! The companion pulls its done line low when it has finished.  The line is
//! long and unshielded, so a single falling edge proves nothing: the
//! validator only accepts a falling edge that is followed by a level that
//! stays low for the whole validation window.
//!
//! ```text
//!             ┌─────────── coarse poll (≈5 s) ◀────────────┐
//!             ▼                                            │
//!   ┌──────────────────┐  no edge   ┌────────┐             │
//!   │ edge queued?     │───────────▶│ sleep  │─────────────┘
//!   └────────┬─────────┘            └────────┘
//!            │ edge
//!            ▼
//!   settle (≈10 ms), sample ── high ──▶ spurious, back to the top
//!            │ low
//!            ▼
//!   sample every ≈10 ms for the window ── high ──▶ bounce, back to the top
//!            │ stayed low
//!            ▼
//!        Confirmed
//! ```
//!
//! The loop blocks between polls on purpose.  There is no other work on the
//! control thread while the companion runs, and reacting up to one poll
//! interval late is fine for this protocol.
//!
//! The validator arms the edge observer but never disarms it: releasing the
//! interrupt is the caller's job, so the validator keeps no state between
//! calls.

use embassy_time::Duration;
use log::{debug, info, warn};

use crate::app::ports::{Clock, EdgeSignal};
use crate::config::ValidationTiming;
use crate::events::{self, EdgeEvent, EdgeQueue};

/// Terminal result of one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The line stayed low for the full window after a falling edge.
    Confirmed,
    /// No qualifying pulse before the overall deadline.
    TimedOut,
}

/// Outcome plus the number of edges that were rejected on the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    /// Spurious edges (level not low after settling) and bounces
    /// (level went high inside the window).
    pub rejected: u32,
}

/// Result of inspecting one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// Level was not low once the edge had settled.
    Spurious,
    /// Level went high before the window elapsed.
    Bounced,
    /// Level held low for the whole window.
    Held,
}

/// Stateless debounced falling-edge / low-level detector.
#[derive(Debug, Clone, Copy)]
pub struct SignalValidator {
    timing: ValidationTiming,
}

impl SignalValidator {
    pub fn new(timing: ValidationTiming) -> Self {
        Self { timing }
    }

    /// Wait for a confirmed low pulse on `signal` or for the overall timeout.
    ///
    /// Leaves the falling-edge observer armed on return.
    pub fn await_confirmed_low<S, C>(
        &self,
        signal: &mut S,
        queue: &'static EdgeQueue,
        clock: &mut C,
    ) -> ValidationReport
    where
        S: EdgeSignal,
        C: Clock,
    {
        // Edges captured before this run belong to nobody.
        events::clear_edges(queue);
        if let Err(e) = signal.arm_falling_edge(queue) {
            warn!("validator: arming falling-edge observer failed: {:?}", e);
        }

        let deadline = clock.now() + self.timing.timeout;
        let mut rejected = 0u32;

        while clock.now() < deadline {
            if let Some(edge) = events::pop_edge(queue) {
                match self.inspect_edge(signal, queue, clock, edge) {
                    Attempt::Held => {
                        info!("validator: done signal confirmed ({} rejected before)", rejected);
                        return ValidationReport {
                            outcome: ValidationOutcome::Confirmed,
                            rejected,
                        };
                    }
                    Attempt::Spurious | Attempt::Bounced => {
                        rejected += 1;
                        continue;
                    }
                }
            }

            let remaining = deadline.saturating_duration_since(clock.now());
            clock.sleep(self.timing.poll_interval.min(remaining));
        }

        info!(
            "validator: no confirmed signal within {}s ({} rejected)",
            self.timing.timeout.as_secs(),
            rejected
        );
        ValidationReport {
            outcome: ValidationOutcome::TimedOut,
            rejected,
        }
    }

    fn inspect_edge<S, C>(
        &self,
        signal: &mut S,
        queue: &EdgeQueue,
        clock: &mut C,
        edge: EdgeEvent,
    ) -> Attempt
    where
        S: EdgeSignal,
        C: Clock,
    {
        clock.sleep(self.timing.edge_settle);
        let sampled_at = clock.now();

        // Anything captured up to now is bounce from this same transition.
        let stale = events::discard_edges_until(queue, sampled_at);
        if stale > 0 {
            debug!("validator: dropped {} edges from the same transition", stale);
        }

        match signal.is_low() {
            Ok(true) => {}
            Ok(false) => {
                debug!("validator: spurious edge at {}ms, line high after settling", edge.at.as_millis());
                return Attempt::Spurious;
            }
            Err(e) => {
                warn!("validator: level read failed: {:?}", e);
                return Attempt::Spurious;
            }
        }

        loop {
            let held = clock.now().saturating_duration_since(sampled_at);
            if held >= self.timing.window {
                return Attempt::Held;
            }
            let left = self
                .timing
                .window
                .checked_sub(held)
                .unwrap_or(Duration::from_ticks(0));
            clock.sleep(self.timing.sample_interval.min(left));

            match signal.is_high() {
                Ok(false) => {}
                Ok(true) => {
                    info!(
                        "validator: line bounced high after {}ms, discarding attempt",
                        clock.now().saturating_duration_since(sampled_at).as_millis()
                    );
                    return Attempt::Bounced;
                }
                Err(e) => {
                    warn!("validator: level read failed inside window: {:?}", e);
                    return Attempt::Bounced;
                }
            }
        }
    }
}
