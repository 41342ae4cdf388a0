//! Interrupt-driven edge events.
//!
//! The done-signal GPIO ISR is the only asynchronous producer in the
//! firmware.  Every falling edge it sees becomes a timestamped
//! [`EdgeEvent`] in a bounded queue; the signal validator drains the
//! queue from the main loop.
//!
//! ```text
//! ┌──────────────┐  try_send   ┌──────────────┐  try_receive  ┌──────────────┐
//! │ GPIO ISR     │────────────▶│  EdgeQueue   │──────────────▶│  Validator   │
//! │ (NEGEDGE)    │             │  (bounded)   │               │  (main loop) │
//! └──────────────┘             └──────────────┘               └──────────────┘
//! ```
//!
//! Both sides are non-blocking, so an edge that fires while the validator
//! is asleep is never lost: it waits in the queue for the next poll.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use log::debug;

/// Maximum number of pending edges.  A bouncing contact produces a
/// handful per transition; anything beyond that is redundant.
pub const EDGE_QUEUE_DEPTH: usize = 8;

/// One observed falling edge on the done-signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Capture time, taken in interrupt context.
    pub at: Instant,
}

/// Queue shared between the ISR (producer) and the main loop (consumer).
pub type EdgeQueue = Channel<CriticalSectionRawMutex, EdgeEvent, EDGE_QUEUE_DEPTH>;

/// Construct an empty queue (usable in `static` initialisers).
pub const fn edge_queue() -> EdgeQueue {
    Channel::new()
}

/// Record an edge.  Safe to call from ISR context.
/// Returns `false` if the queue is full (edge dropped).
pub fn push_edge(queue: &EdgeQueue, at: Instant) -> bool {
    queue.try_send(EdgeEvent { at }).is_ok()
}

/// Take the oldest pending edge, if any.
pub fn pop_edge(queue: &EdgeQueue) -> Option<EdgeEvent> {
    queue.try_receive().ok()
}

/// Discard every pending edge captured at or before `cutoff`.
///
/// Edges captured later are put back.  The ISR may push between the drain
/// and the put-back; such an edge can land ahead of the kept ones or take
/// their slot, in which case the kept edge is dropped and logged.  Either
/// way a later edge is still pending, which is all the validator needs.
/// Returns the number of edges discarded.
pub fn discard_edges_until(queue: &EdgeQueue, cutoff: Instant) -> usize {
    let mut kept: heapless::Vec<EdgeEvent, EDGE_QUEUE_DEPTH> = heapless::Vec::new();
    let mut discarded = 0;
    while let Some(event) = pop_edge(queue) {
        if event.at <= cutoff {
            discarded += 1;
        } else {
            // Capacity equals the queue depth, so this cannot overflow.
            let _ = kept.push(event);
        }
    }
    let lost = requeue(queue, &kept);
    if lost > 0 {
        debug!("events: {} kept edge(s) dropped on requeue, queue full", lost);
    }
    discarded
}

/// Put `events` back in order.  Returns how many did not fit.
fn requeue(queue: &EdgeQueue, events: &[EdgeEvent]) -> usize {
    events.iter().filter(|&&event| queue.try_send(event).is_err()).count()
}

/// Drop every pending edge.
pub fn clear_edges(queue: &EdgeQueue) {
    queue.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_ms(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn edges_come_out_in_fifo_order() {
        let q = edge_queue();
        assert!(push_edge(&q, at_ms(1)));
        assert!(push_edge(&q, at_ms(2)));
        assert_eq!(pop_edge(&q).map(|e| e.at), Some(at_ms(1)));
        assert_eq!(pop_edge(&q).map(|e| e.at), Some(at_ms(2)));
        assert_eq!(pop_edge(&q), None);
    }

    #[test]
    fn full_queue_drops_newest() {
        let q = edge_queue();
        for ms in 0..EDGE_QUEUE_DEPTH as u64 {
            assert!(push_edge(&q, at_ms(ms)));
        }
        assert!(!push_edge(&q, at_ms(100)));
        assert_eq!(pop_edge(&q).map(|e| e.at), Some(at_ms(0)));
    }

    #[test]
    fn discard_keeps_later_edges() {
        let q = edge_queue();
        push_edge(&q, at_ms(10));
        push_edge(&q, at_ms(12));
        push_edge(&q, at_ms(500));
        assert_eq!(discard_edges_until(&q, at_ms(20)), 2);
        assert_eq!(pop_edge(&q).map(|e| e.at), Some(at_ms(500)));
        assert_eq!(pop_edge(&q), None);
    }

    #[test]
    fn requeue_reports_edges_that_no_longer_fit() {
        let q = edge_queue();
        for ms in 0..EDGE_QUEUE_DEPTH as u64 - 1 {
            push_edge(&q, at_ms(1_000 + ms));
        }
        let kept = [EdgeEvent { at: at_ms(30) }, EdgeEvent { at: at_ms(40) }];
        assert_eq!(requeue(&q, &kept), 1);
        let last = core::iter::from_fn(|| pop_edge(&q)).last();
        assert_eq!(last.map(|e| e.at), Some(at_ms(30)));
    }
}
