//! # Timer Subsystem
//!
//! A single min-heap of delayed actions (§4.5), ordered by `at_time`
//! ascending. Polled at ~1 Hz by the scheduler's dispatcher loop; every task
//! whose `at_time <= now` is popped and handed back for the scheduler to act
//! on, then typically reschedules itself.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::overlay::PeerId;
use crate::transfer::Direction;

/// One of the three task families driven by the timer heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Re-pumps the scheduler's queued transfers; reschedules itself.
    SchedulerTick,
    /// Terminates a transfer if it has made no progress within the
    /// configured timeout.
    TerminateByTimeout {
        /// The peer the transfer is with.
        peer: PeerId,
        /// Which map (`outgoing`/`incoming`) the transfer lives in.
        direction: Direction,
        /// The transfer's application-assigned id, for staleness checks
        /// (a new transfer may have taken the peer's slot by the time
        /// this fires).
        id: String,
    },
    /// Re-sends the current acknowledgement for a stalled incoming
    /// transfer, up to a configured attempt limit.
    AckRetransmit {
        /// The peer the transfer is with.
        peer: PeerId,
        /// The transfer's application-assigned id.
        id: String,
    },
}

/// A single delayed action, ordered by `at_time` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Unix timestamp, in milliseconds, at which this task becomes due.
    pub at_time: i64,
    /// The action to run when due.
    pub action: TaskAction,
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) behaves as a min-heap on `at_time`.
        other.at_time.cmp(&self.at_time)
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The min-heap of pending timer tasks.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<ScheduledTask>,
}

impl TimerQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }

    /// Schedule `action` to run at `at_time`.
    pub fn schedule(&mut self, at_time: i64, action: TaskAction) {
        self.heap.push(ScheduledTask { at_time, action });
    }

    /// Pop and return every task due at or before `now`, in ascending
    /// `at_time` order.
    pub fn drain_due(&mut self, now: i64) -> Vec<ScheduledTask> {
        let mut due = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.at_time > now {
                break;
            }
            due.push(self.heap.pop().expect("peeked Some"));
        }
        due
    }

    /// Number of pending tasks, for diagnostics/tests.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue holds no pending tasks.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_due_returns_tasks_in_time_order() {
        let mut q = TimerQueue::new();
        q.schedule(300, TaskAction::SchedulerTick);
        q.schedule(100, TaskAction::AckRetransmit { peer: PeerId::new("a"), id: "x".into() });
        q.schedule(200, TaskAction::SchedulerTick);

        let due = q.drain_due(250);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].at_time, 100);
        assert_eq!(due[1].at_time, 200);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn drain_due_leaves_future_tasks() {
        let mut q = TimerQueue::new();
        q.schedule(1000, TaskAction::SchedulerTick);
        assert!(q.drain_due(500).is_empty());
        assert_eq!(q.len(), 1);
    }
}
