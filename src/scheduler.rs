//! Tick-keyed deferred work for a single-threaded host loop.
//!
//! Tasks are ordered by (due tick, insertion order), so two tasks due on the
//! same tick always run in the order they were scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Scheduled<T> {
    due: u64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug)]
pub struct TickScheduler<T> {
    queue: BinaryHeap<Reverse<Scheduled<T>>>,
    current_tick: u64,
    next_seq: u64,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TickScheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            current_tick: 0,
            next_seq: 0,
        }
    }

    pub fn now(&self) -> u64 {
        self.current_tick
    }

    /// Schedule `task` to run `delay` ticks from now. A delay of zero is
    /// treated as one: nothing scheduled during a tick runs in that same tick.
    pub fn schedule_in(&mut self, delay: u64, task: T) -> u64 {
        let due = self.current_tick.saturating_add(delay.max(1));
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { due, seq, task }));
        due
    }

    /// Advance the clock by one tick and return every task now due, in order.
    pub fn advance(&mut self) -> Vec<T> {
        self.current_tick += 1;
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.due > self.current_tick {
                break;
            }
            if let Some(Reverse(item)) = self.queue.pop() {
                due.push(item.task);
            }
        }
        due
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}
