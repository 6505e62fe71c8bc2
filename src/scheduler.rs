//! Tick-keyed task queue
//!
//! Tasks are ordered by due tick, then by insertion order within a tick, so
//! draining is deterministic. The queue is plain data and serializes as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Delayed work, due at an absolute game tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickScheduler<T> {
    queue: BTreeMap<u64, Vec<T>>,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
        }
    }
}

impl<T> TickScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run once `now + delay` is reached
    pub fn schedule(&mut self, now: u64, delay: u64, task: T) -> u64 {
        let due = now.saturating_add(delay);
        self.queue.entry(due).or_default().push(task);
        due
    }

    /// Remove and return every task due at or before `now`
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let later = match now.checked_add(1) {
            Some(next) => self.queue.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.queue, later);
        due.into_values().flatten().collect()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        self.queue
            .iter()
            .flat_map(|(due, tasks)| tasks.iter().map(move |t| (*due, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_in_due_order() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(10, 5, "b");
        scheduler.schedule(10, 2, "a");
        scheduler.schedule(10, 5, "c");
        scheduler.schedule(10, 50, "late");

        assert!(scheduler.drain_due(11).is_empty());
        assert_eq!(scheduler.drain_due(15), vec!["a", "b", "c"]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(60));
    }

    #[test]
    fn test_zero_delay_is_due_now() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(7, 0, 1u32);
        assert_eq!(scheduler.drain_due(7), vec![1]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_drain_at_max_tick() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(u64::MAX, 10, 1u32);
        assert_eq!(scheduler.drain_due(u64::MAX), vec![1]);
    }

    #[test]
    fn test_survives_json() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule(100, 20, String::from("grow"));
        let json = serde_json::to_string(&scheduler).unwrap();
        let back: TickScheduler<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scheduler);
    }
}
