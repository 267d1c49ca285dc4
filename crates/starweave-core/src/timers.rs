//! Deferred work polled once per tick.
//!
//! A min-heap of `(due_at, kind)` entries. Rescheduling a kind bumps its
//! generation so earlier entries of that kind are skipped when they pop,
//! which is how the save debounce restarts its quiet period.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::state::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Flush after the quiet period following a meaningful change.
    DebouncedSave,
    /// Unconditional flush capturing resource counters.
    PeriodicSave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due_at: Timestamp,
    seq: u64,
    kind: TimerKind,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct Timers {
    heap: BinaryHeap<Reverse<Entry>>,
    generations: HashMap<TimerKind, u64>,
    seq: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending entry of `kind` with one due at `due_at`.
    pub fn reschedule(&mut self, kind: TimerKind, due_at: Timestamp) {
        let generation = self.bump(kind);
        self.seq += 1;
        self.heap.push(Reverse(Entry {
            due_at,
            seq: self.seq,
            kind,
            generation,
        }));
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.bump(kind);
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        let current = self.generations.get(&kind).copied().unwrap_or(0);
        self.heap
            .iter()
            .any(|Reverse(e)| e.kind == kind && e.generation == current)
    }

    /// Earliest live deadline, if any.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.heap
            .iter()
            .filter(|Reverse(e)| self.is_live(e))
            .map(|Reverse(e)| e.due_at)
            .min()
    }

    /// Pop every live entry due at or before `now`, in deadline order.
    pub fn pop_due(&mut self, now: Timestamp) -> Vec<TimerKind> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek().copied() {
            if entry.due_at > now {
                break;
            }
            self.heap.pop();
            if self.is_live(&entry) {
                due.push(entry.kind);
            }
        }
        due
    }

    fn is_live(&self, entry: &Entry) -> bool {
        self.generations.get(&entry.kind).copied().unwrap_or(0) == entry.generation
    }

    fn bump(&mut self, kind: TimerKind) -> u64 {
        let generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        *generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_in_deadline_order() {
        let mut timers = Timers::new();
        timers.reschedule(TimerKind::PeriodicSave, 200);
        timers.reschedule(TimerKind::DebouncedSave, 100);
        assert!(timers.pop_due(50).is_empty());
        assert_eq!(
            timers.pop_due(250),
            vec![TimerKind::DebouncedSave, TimerKind::PeriodicSave]
        );
        assert!(timers.pop_due(1000).is_empty());
    }

    #[test]
    fn test_reschedule_debounces() {
        let mut timers = Timers::new();
        timers.reschedule(TimerKind::DebouncedSave, 500);
        timers.reschedule(TimerKind::DebouncedSave, 900);
        assert!(timers.pop_due(600).is_empty());
        assert_eq!(timers.next_due(), Some(900));
        assert_eq!(timers.pop_due(900), vec![TimerKind::DebouncedSave]);
        assert!(!timers.is_pending(TimerKind::DebouncedSave));
    }

    #[test]
    fn test_cancel() {
        let mut timers = Timers::new();
        timers.reschedule(TimerKind::DebouncedSave, 10);
        timers.cancel(TimerKind::DebouncedSave);
        assert!(!timers.is_pending(TimerKind::DebouncedSave));
        assert!(timers.pop_due(100).is_empty());
    }
}
