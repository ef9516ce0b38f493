//! Timer queue on the page's virtual clock.

use core_types::Millis;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<T> {
    due: Millis,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // min-heap on (due, seq)
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Timers fire in due order; equal due times fire in scheduling order.
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Millis, task: T) {
        self.seq += 1;
        self.heap.push(Entry {
            due,
            seq: self.seq,
            task,
        });
    }

    /// Drops every pending task matching `pred`; returns how many were dropped.
    pub fn cancel<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.heap.len();
        self.heap.retain(|e| !pred(&e.task));
        before - self.heap.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.heap.peek().map(|e| e.due)
    }

    /// Pops the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, T)> {
        if self.next_due()? > now {
            return None;
        }
        self.heap.pop().map(|e| (e.due, e.task))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_then_insertion_order() {
        let mut q = TimerQueue::new();
        q.schedule(20, "late");
        q.schedule(10, "first");
        q.schedule(10, "second");
        assert_eq!(q.pop_due(5), None);
        assert_eq!(q.pop_due(10), Some((10, "first")));
        assert_eq!(q.pop_due(10), Some((10, "second")));
        assert_eq!(q.pop_due(10), None);
        assert_eq!(q.pop_due(100), Some((20, "late")));
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_drops_matching() {
        let mut q = TimerQueue::new();
        q.schedule(1, 1);
        q.schedule(2, 2);
        q.schedule(3, 1);
        assert_eq!(q.cancel(|t| *t == 1), 2);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_due(), Some(2));
    }
}
