//! Scheduled contact events and the time-ordered queue holding them
//!
//! Each event snapshots the version of every ball it depends on. Balls bump
//! their version whenever their motion changes outside the prediction, so an
//! outdated event is recognised by a version mismatch and dropped when it
//! reaches the head of the queue. Nothing is ever removed eagerly.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::arena::Axis;
use super::ball::BallKey;

/// What a scheduled event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Ball reaches an arena wall
    Boundary { ball: BallKey, axis: Axis },
    /// Two balls touch
    BallPair { a: BallKey, b: BallKey },
    /// Ball touches a wall object (index into the kernel's scene snapshot)
    SceneWall { ball: BallKey, object: usize },
    /// Ball enters or leaves an input port
    SceneInput { ball: BallKey, object: usize },
    /// Ball reaches an output port
    SceneOutput { ball: BallKey, object: usize },
}

impl EventKind {
    /// Primary ball
    pub fn ball(&self) -> BallKey {
        match *self {
            EventKind::Boundary { ball, .. }
            | EventKind::SceneWall { ball, .. }
            | EventKind::SceneInput { ball, .. }
            | EventKind::SceneOutput { ball, .. } => ball,
            EventKind::BallPair { a, .. } => a,
        }
    }

    /// Second ball, for pair events
    pub fn partner(&self) -> Option<BallKey> {
        match *self {
            EventKind::BallPair { b, .. } => Some(b),
            _ => None,
        }
    }
}

/// An event with its absolute time and version snapshot
#[derive(Debug, Clone, Copy)]
pub struct ScheduledEvent {
    /// Absolute sim time
    pub time: f64,
    pub kind: EventKind,
    /// Versions of `kind.ball()` and `kind.partner()` at scheduling time
    pub versions: [u64; 2],
    /// Insertion order, breaks time ties deterministically
    seq: u64,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-queue of events ordered by time, then insertion
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, kind: EventKind, versions: [u64; 2]) {
        let seq = self.next_seq;
        self.next_seq += 1;
        log::trace!("schedule {kind:?} at t={time:.6}");
        self.heap.push(Reverse(ScheduledEvent {
            time,
            kind,
            versions,
            seq,
        }));
    }

    /// Earliest event, stale or not
    pub fn peek(&self) -> Option<&ScheduledEvent> {
        self.heap.peek().map(|Reverse(ev)| ev)
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.peek().map(|ev| ev.time)
    }

    /// All queued events in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.heap.iter().map(|Reverse(ev)| ev)
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop().map(|Reverse(ev)| ev)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys() -> (BallKey, BallKey) {
        let mut map: SlotMap<BallKey, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    #[test]
    fn test_pops_in_time_order() {
        let (a, b) = keys();
        let mut q = EventQueue::new();
        q.push(3.0, EventKind::Boundary { ball: a, axis: Axis::X }, [0, 0]);
        q.push(1.0, EventKind::BallPair { a, b }, [0, 0]);
        q.push(2.0, EventKind::SceneWall { ball: b, object: 0 }, [0, 0]);

        assert_eq!(q.peek_time(), Some(1.0));
        let times: Vec<f64> = std::iter::from_fn(|| q.pop()).map(|e| e.time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let (a, b) = keys();
        let mut q = EventQueue::new();
        q.push(1.0, EventKind::Boundary { ball: b, axis: Axis::Y }, [0, 0]);
        q.push(1.0, EventKind::Boundary { ball: a, axis: Axis::X }, [0, 0]);
        assert_eq!(q.pop().unwrap().kind.ball(), b);
        assert_eq!(q.pop().unwrap().kind.ball(), a);
    }

    #[test]
    fn test_partner() {
        let (a, b) = keys();
        assert_eq!(EventKind::BallPair { a, b }.partner(), Some(b));
        assert_eq!(EventKind::SceneInput { ball: a, object: 2 }.partner(), None);
    }
}
