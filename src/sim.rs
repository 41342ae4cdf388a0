//! Host-side simulation of the beacon hardware.
//!
//! A [`SimWorld`] holds virtual time and the state of every simulated
//! peripheral.  Handles taken from it ([`SimClock`], [`SimSignal`],
//! [`SimRail`], [`SimRadio`], [`SimSampler`], [`RecordingSink`]) implement
//! the same ports the firmware adapters do, so the real service code runs
//! unchanged against it.
//!
//! Time only moves when somebody calls [`SimClock::sleep`].  Falling edges
//! of scripted low pulses that fall inside a sleep are pushed into the
//! armed edge queue at their exact capture time, the way the GPIO ISR
//! would have done it.

use std::cell::RefCell;
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::advertising::Advertisement;
use crate::app::events::{AppEvent, RadioOp};
use crate::app::ports::{Advertiser, Clock, EdgeSignal, EventSink, SensorSampler};
use crate::error::{GpioError, RadioError};
use crate::events::{self, EdgeQueue};
use crate::sensors::SupplyReading;

/// One recorded advertiser call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioCall {
    Enable,
    /// Payload the advertisement carried when it was configured.
    Configure(SupplyReading),
    Start,
    Stop,
}

/// Companion behaviour: after every rail power-up it pulls the done line
/// low `done_after` later and holds it for `hold_low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanionScript {
    pub done_after: Duration,
    pub hold_low: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Pulse {
    at: Instant,
    low_for: Duration,
}

impl Pulse {
    fn holds_low(&self, t: Instant) -> bool {
        t >= self.at && t < self.at + self.low_for
    }
}

struct WorldState {
    start: Instant,
    now: Instant,

    pulses: Vec<Pulse>,
    armed: Option<&'static EdgeQueue>,
    arm_count: u32,
    disarm_count: u32,
    read_fault: bool,

    rail_high: bool,
    rail_log: Vec<(Instant, bool)>,
    companion: Option<CompanionScript>,

    radio_log: Vec<(Instant, RadioCall)>,
    failing_ops: Vec<RadioOp>,

    reading: SupplyReading,
    samples: u32,

    events: Vec<AppEvent>,
}

impl WorldState {
    fn line_low(&self) -> bool {
        self.pulses.iter().any(|p| p.holds_low(self.now))
    }

    fn advance(&mut self, by: Duration) {
        let from = self.now;
        self.now = from + by;

        let Some(queue) = self.armed else { return };
        let mut edges: Vec<Instant> = self
            .pulses
            .iter()
            .map(|p| p.at)
            .filter(|&at| at > from && at <= self.now)
            .collect();
        edges.sort_unstable();
        for at in edges {
            events::push_edge(queue, at);
        }
    }

    fn record_radio(&mut self, op: RadioOp, call: RadioCall) -> Result<(), RadioError> {
        if self.failing_ops.contains(&op) {
            return Err(match op {
                RadioOp::Enable => RadioError::StackInit(-1),
                RadioOp::Configure => RadioError::Configure(-1),
                RadioOp::Start => RadioError::Start(-1),
                RadioOp::Stop => RadioError::Stop(-1),
            });
        }
        self.radio_log.push((self.now, call));
        Ok(())
    }
}

/// Shared simulated environment.  Cheap to clone; every clone sees the
/// same state.
#[derive(Clone)]
pub struct SimWorld {
    state: Rc<RefCell<WorldState>>,
    queue: &'static EdgeQueue,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        let start = Instant::from_ticks(0);
        let state = WorldState {
            start,
            now: start,
            pulses: Vec::new(),
            armed: None,
            arm_count: 0,
            disarm_count: 0,
            read_fault: false,
            rail_high: false,
            rail_log: Vec::new(),
            companion: None,
            radio_log: Vec::new(),
            failing_ops: Vec::new(),
            reading: SupplyReading::default(),
            samples: 0,
            events: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            // Leaked so it can stand in for the firmware's `static` queue.
            queue: Box::leak(Box::new(events::edge_queue())),
        }
    }

    // --- handles ---

    pub fn clock(&self) -> SimClock {
        SimClock { world: self.clone() }
    }

    pub fn signal(&self) -> SimSignal {
        SimSignal { world: self.clone() }
    }

    pub fn rail(&self) -> SimRail {
        SimRail { world: self.clone() }
    }

    pub fn radio(&self) -> SimRadio {
        SimRadio { world: self.clone() }
    }

    pub fn sampler(&self) -> SimSampler {
        SimSampler { world: self.clone() }
    }

    pub fn sink(&self) -> RecordingSink {
        RecordingSink { world: self.clone() }
    }

    pub fn queue(&self) -> &'static EdgeQueue {
        self.queue
    }

    // --- time ---

    pub fn now(&self) -> Instant {
        self.state.borrow().now
    }

    /// Virtual time since the world was created.
    pub fn elapsed(&self) -> Duration {
        let s = self.state.borrow();
        s.now - s.start
    }

    /// Convert an offset from world creation into an instant.
    pub fn at(&self, offset: Duration) -> Instant {
        self.state.borrow().start + offset
    }

    // --- done-signal line ---

    /// Script a low pulse whose falling edge is `offset` after world
    /// creation.
    pub fn schedule_low(&self, offset: Duration, low_for: Duration) {
        let at = self.at(offset);
        self.state.borrow_mut().pulses.push(Pulse { at, low_for });
    }

    /// Make the companion answer every power-up with a done pulse.
    pub fn set_companion(&self, script: Option<CompanionScript>) {
        self.state.borrow_mut().companion = script;
    }

    /// Queue an edge captured "now", as if left over from earlier activity.
    pub fn inject_stale_edge(&self) {
        events::push_edge(self.queue, self.now());
    }

    /// Make every level read fail until cleared.
    pub fn set_read_fault(&self, fault: bool) {
        self.state.borrow_mut().read_fault = fault;
    }

    pub fn signal_armed(&self) -> bool {
        self.state.borrow().armed.is_some()
    }

    pub fn arm_count(&self) -> u32 {
        self.state.borrow().arm_count
    }

    pub fn disarm_count(&self) -> u32 {
        self.state.borrow().disarm_count
    }

    // --- rail ---

    pub fn rail_high(&self) -> bool {
        self.state.borrow().rail_high
    }

    /// Every rail write with its timestamp.
    pub fn rail_log(&self) -> Vec<(Instant, bool)> {
        self.state.borrow().rail_log.clone()
    }

    // --- radio ---

    pub fn radio_log(&self) -> Vec<(Instant, RadioCall)> {
        self.state.borrow().radio_log.clone()
    }

    /// Make every call of `op` fail from now on.
    pub fn fail_radio(&self, op: RadioOp) {
        self.state.borrow_mut().failing_ops.push(op);
    }

    // --- sampler ---

    pub fn set_reading(&self, reading: SupplyReading) {
        self.state.borrow_mut().reading = reading;
    }

    pub fn sample_count(&self) -> u32 {
        self.state.borrow().samples
    }

    // --- sink ---

    pub fn events(&self) -> Vec<AppEvent> {
        self.state.borrow().events.clone()
    }
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

pub struct SimClock {
    world: SimWorld,
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.world.now()
    }

    fn sleep(&mut self, duration: Duration) {
        self.world.state.borrow_mut().advance(duration);
    }
}

pub struct SimSignal {
    world: SimWorld,
}

impl ErrorType for SimSignal {
    type Error = GpioError;
}

impl InputPin for SimSignal {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        let s = self.world.state.borrow();
        if s.read_fault {
            return Err(GpioError::Read(-1));
        }
        Ok(s.line_low())
    }
}

impl EdgeSignal for SimSignal {
    fn arm_falling_edge(&mut self, queue: &'static EdgeQueue) -> Result<(), Self::Error> {
        let mut s = self.world.state.borrow_mut();
        s.armed = Some(queue);
        s.arm_count += 1;
        Ok(())
    }

    fn disarm(&mut self) -> Result<(), Self::Error> {
        let mut s = self.world.state.borrow_mut();
        s.armed = None;
        s.disarm_count += 1;
        Ok(())
    }
}

pub struct SimRail {
    world: SimWorld,
}

impl SimRail {
    fn write(&mut self, high: bool) {
        let mut s = self.world.state.borrow_mut();
        let now = s.now;
        let rising = high && !s.rail_high;
        s.rail_high = high;
        s.rail_log.push((now, high));
        if rising {
            if let Some(script) = s.companion {
                s.pulses.push(Pulse {
                    at: now + script.done_after,
                    low_for: script.hold_low,
                });
            }
        }
    }
}

impl ErrorType for SimRail {
    type Error = GpioError;
}

impl OutputPin for SimRail {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

pub struct SimRadio {
    world: SimWorld,
}

impl Advertiser for SimRadio {
    fn enable(&mut self) -> Result<(), RadioError> {
        self.world.state.borrow_mut().record_radio(RadioOp::Enable, RadioCall::Enable)
    }

    fn configure(&mut self, advertisement: &Advertisement) -> Result<(), RadioError> {
        advertisement.encode()?;
        let reading = advertisement.payload().reading();
        self.world
            .state
            .borrow_mut()
            .record_radio(RadioOp::Configure, RadioCall::Configure(reading))
    }

    fn start(&mut self) -> Result<(), RadioError> {
        self.world.state.borrow_mut().record_radio(RadioOp::Start, RadioCall::Start)
    }

    fn stop(&mut self) -> Result<(), RadioError> {
        self.world.state.borrow_mut().record_radio(RadioOp::Stop, RadioCall::Stop)
    }
}

pub struct SimSampler {
    world: SimWorld,
}

impl SensorSampler for SimSampler {
    fn sample(&mut self) -> SupplyReading {
        let mut s = self.world.state.borrow_mut();
        s.samples += 1;
        s.reading
    }
}

pub struct RecordingSink {
    world: SimWorld,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.world.state.borrow_mut().events.push(event.clone());
    }
}
