//! Deferred control switches, ordered by deadline

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::ball::BallId;
use crate::player::{ActorId, Team};

/// A switch waiting for its deadline.
///
/// Field order is the heap order: deadline first, then scheduling sequence so
/// equal deadlines fire in the order they were queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PendingSwitch {
    pub deadline: Duration,
    pub seq: u64,
    pub team: Team,
    pub ball: BallId,
    pub receiver: ActorId,
}

/// Min-heap of pending switches
#[derive(Debug, Default, Clone)]
pub struct SwitchQueue {
    heap: BinaryHeap<Reverse<PendingSwitch>>,
    next_seq: u64,
}

impl SwitchQueue {
    pub fn push(&mut self, team: Team, ball: BallId, receiver: ActorId, deadline: Duration) -> PendingSwitch {
        let entry = PendingSwitch {
            deadline,
            seq: self.next_seq,
            team,
            ball,
            receiver,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
        entry
    }

    /// Pop the earliest entry if its deadline has elapsed
    pub fn pop_due(&mut self, now: Duration) -> Option<PendingSwitch> {
        match self.heap.peek() {
            Some(Reverse(entry)) if entry.deadline <= now => self.heap.pop().map(|Reverse(e)| e),
            _ => None,
        }
    }

    /// Remove every entry matching `pred`, returning them in deadline order
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&PendingSwitch) -> bool) -> Vec<PendingSwitch> {
        let mut cancelled = Vec::new();
        let mut remaining = BinaryHeap::new();

        while let Some(Reverse(entry)) = self.heap.pop() {
            if pred(&entry) {
                cancelled.push(entry);
            } else {
                remaining.push(Reverse(entry));
            }
        }

        self.heap = remaining;
        cancelled
    }

    /// Point every entry matching `pred` at `receiver`, keeping its deadline
    /// and place in the queue. Returns the entries as they were before.
    pub fn retarget_where(
        &mut self,
        receiver: ActorId,
        mut pred: impl FnMut(&PendingSwitch) -> bool,
    ) -> Vec<PendingSwitch> {
        let mut previous = Vec::new();
        let mut remaining = BinaryHeap::new();

        while let Some(Reverse(mut entry)) = self.heap.pop() {
            if pred(&entry) {
                previous.push(entry);
                entry.receiver = receiver;
            }
            remaining.push(Reverse(entry));
        }

        self.heap = remaining;
        previous
    }

    pub fn contains_receiver(&self, actor: ActorId) -> bool {
        self.heap.iter().any(|Reverse(e)| e.receiver == actor)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries in deadline order
    pub fn sorted(&self) -> Vec<PendingSwitch> {
        let mut entries: Vec<_> = self.heap.iter().map(|Reverse(e)| *e).collect();
        entries.sort();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pops_in_deadline_order() {
        let mut q = SwitchQueue::default();
        q.push(Team::Home, BallId(0), ActorId(1), ms(500));
        q.push(Team::Home, BallId(0), ActorId(2), ms(200));

        assert_eq!(q.pop_due(ms(100)), None);
        assert_eq!(q.pop_due(ms(600)).map(|e| e.receiver), Some(ActorId(2)));
        assert_eq!(q.pop_due(ms(600)).map(|e| e.receiver), Some(ActorId(1)));
        assert!(q.is_empty());
    }

    #[test]
    fn test_equal_deadlines_keep_queue_order() {
        let mut q = SwitchQueue::default();
        q.push(Team::Home, BallId(0), ActorId(3), ms(500));
        q.push(Team::Home, BallId(1), ActorId(1), ms(500));

        assert_eq!(q.pop_due(ms(500)).map(|e| e.receiver), Some(ActorId(3)));
        assert_eq!(q.pop_due(ms(500)).map(|e| e.receiver), Some(ActorId(1)));
    }

    #[test]
    fn test_cancel_where() {
        let mut q = SwitchQueue::default();
        q.push(Team::Home, BallId(0), ActorId(1), ms(500));
        q.push(Team::Home, BallId(1), ActorId(2), ms(400));

        let cancelled = q.cancel_where(|e| e.ball == BallId(0));
        assert_eq!(cancelled.len(), 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.sorted()[0].receiver, ActorId(2));
    }

    #[test]
    fn test_retarget_keeps_deadline_order() {
        let mut q = SwitchQueue::default();
        q.push(Team::Home, BallId(0), ActorId(1), ms(500));
        q.push(Team::Home, BallId(1), ActorId(2), ms(400));

        let previous = q.retarget_where(ActorId(3), |e| e.ball == BallId(0));
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].receiver, ActorId(1));
        assert!(q.contains_receiver(ActorId(3)));
        assert!(!q.contains_receiver(ActorId(1)));

        assert_eq!(q.pop_due(ms(600)).map(|e| e.receiver), Some(ActorId(2)));
        let moved = q.pop_due(ms(600));
        assert_eq!(moved.map(|e| (e.receiver, e.deadline, e.seq)), Some((ActorId(3), ms(500), 0)));
    }
}
