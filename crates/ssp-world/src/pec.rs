//! Pending event container.

use crate::event::Event;
use crate::individual::IndividualKey;
use ssp_core::{Error, Result};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry. Ordered so the earliest time, then the earliest insertion,
/// sits on top of the max-heap.
#[derive(Debug)]
struct Scheduled {
    time: f64,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Time-ordered queue of scheduled events.
///
/// Events with equal timestamps pop in insertion order.
#[derive(Debug, Default)]
pub struct Pec {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl Pec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event`. Negative (and NaN) timestamps mark suppressed
    /// events and are dropped; returns whether the event was queued.
    pub fn insert(&mut self, event: Event) -> bool {
        let time = event.time();
        if !(time >= 0.0) {
            return false;
        }

        self.heap.push(Scheduled {
            time,
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
        true
    }

    /// Remove and return the earliest event
    pub fn pop_min(&mut self) -> Result<Event> {
        self.heap
            .pop()
            .map(|scheduled| scheduled.event)
            .ok_or(Error::EmptyQueue)
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|scheduled| scheduled.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending event owned by `owner`. Returns how many were dropped.
    pub fn remove_owned_by(&mut self, owner: IndividualKey) -> usize {
        let before = self.heap.len();
        self.heap
            .retain(|scheduled| scheduled.event.owner() != Some(owner));
        before - self.heap.len()
    }
}
