//! Timer bookkeeping for a playback session
//!
//! Every pending timer lives in one ordered collection keyed by due time and
//! insertion sequence, so the whole session can be cancelled at once and
//! nothing fires unless the owner polls for it.

use std::collections::{BTreeMap, HashMap};

/// Identifies a scheduled task for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Task<A> {
    id: u64,
    action: A,
    /// Re-arm interval for repeating tasks
    interval: Option<u64>,
}

/// Ordered set of `(due time, action)` pairs
#[derive(Debug)]
pub struct Scheduler<A> {
    queue: BTreeMap<(u64, u64), Task<A>>,
    /// task id -> queue key
    keys: HashMap<u64, (u64, u64)>,
    next_id: u64,
    next_seq: u64,
}

impl<A: Clone> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            keys: HashMap::new(),
            next_id: 0,
            next_seq: 0,
        }
    }

    fn insert(&mut self, due: u64, task: Task<A>) {
        let key = (due, self.next_seq);
        self.next_seq += 1;
        self.keys.insert(task.id, key);
        self.queue.insert(key, task);
    }

    fn new_task(&mut self, action: A, interval: Option<u64>) -> Task<A> {
        let id = self.next_id;
        self.next_id += 1;
        Task {
            id,
            action,
            interval,
        }
    }

    /// Fire `action` once at `due`
    pub fn schedule_at(&mut self, due: u64, action: A) -> TimerHandle {
        let task = self.new_task(action, None);
        let handle = TimerHandle(task.id);
        self.insert(due, task);
        handle
    }

    /// Fire `action` at `first_due` and then every `interval` ms until cancelled.
    /// A zero interval is treated as 1 ms.
    pub fn schedule_repeating(&mut self, first_due: u64, interval: u64, action: A) -> TimerHandle {
        let task = self.new_task(action, Some(interval.max(1)));
        let handle = TimerHandle(task.id);
        self.insert(first_due, task);
        handle
    }

    /// Returns false if the task already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.keys.remove(&handle.0) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Cancel everything; returns how many tasks were pending
    pub fn cancel_all(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        self.keys.clear();
        count
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Pending actions in firing order
    pub fn actions(&self) -> impl Iterator<Item = &A> {
        self.queue.values().map(|task| &task.action)
    }

    /// Remove and return the earliest task due at or before `now`.
    ///
    /// Tasks come out in non-decreasing due order; equal due times keep
    /// insertion order. A repeating task is re-armed before it is returned,
    /// so cancelling between pops stops it.
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, A)> {
        let (&key, _) = self.queue.first_key_value()?;
        if key.0 > now {
            return None;
        }
        let task = self.queue.remove(&key)?;
        self.keys.remove(&task.id);

        let action = task.action.clone();
        if let Some(interval) = task.interval {
            self.insert(key.0 + interval, task);
        }
        Some((key.0, action))
    }
}

impl<A: Clone> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>, now: u64) -> Vec<(u64, &'static str)> {
        std::iter::from_fn(|| scheduler.pop_due(now)).collect()
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(1000, "c");
        scheduler.schedule_at(0, "a");
        scheduler.schedule_at(500, "b");
        assert_eq!(scheduler.next_due(), Some(0));
        assert_eq!(drain(&mut scheduler, 600), vec![(0, "a"), (500, "b")]);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(drain(&mut scheduler, 1000), vec![(1000, "c")]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(500, "first");
        scheduler.schedule_at(500, "second");
        assert_eq!(drain(&mut scheduler, 500), vec![(500, "first"), (500, "second")]);
    }

    #[test]
    fn test_nothing_fires_early() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(500, "a");
        assert_eq!(scheduler.pop_due(499), None);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_repeating_task_rearms() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(500, 500, "tick");
        assert_eq!(
            drain(&mut scheduler, 1600),
            vec![(500, "tick"), (1000, "tick"), (1500, "tick")]
        );
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due(), Some(2000));
    }

    #[test]
    fn test_repeating_interleaves_with_one_shots() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(0, "note0");
        scheduler.schedule_at(500, "note1");
        scheduler.schedule_at(1000, "note2");
        scheduler.schedule_repeating(500, 500, "tick");
        let fired: Vec<_> = drain(&mut scheduler, 1000).into_iter().map(|(_, a)| a).collect();
        assert_eq!(fired, vec!["note0", "note1", "tick", "note2", "tick"]);
    }

    #[test]
    fn test_cancel_single() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.schedule_at(100, "a");
        scheduler.schedule_at(200, "b");
        assert!(scheduler.cancel(a));
        assert!(!scheduler.cancel(a));
        assert_eq!(drain(&mut scheduler, 1000), vec![(200, "b")]);
    }

    #[test]
    fn test_cancel_repeating_after_it_fired() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.schedule_repeating(100, 100, "tick");
        assert_eq!(scheduler.pop_due(100), Some((100, "tick")));
        assert!(scheduler.cancel(tick));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = Scheduler::new();
        for due in [0, 500, 1000] {
            scheduler.schedule_at(due, "note");
        }
        scheduler.schedule_repeating(500, 500, "tick");
        assert_eq!(scheduler.cancel_all(), 4);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.pop_due(u64::MAX), None);
        assert_eq!(scheduler.cancel_all(), 0);
    }

    #[test]
    fn test_actions_in_firing_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(20, "late");
        scheduler.schedule_at(10, "early");
        let actions: Vec<_> = scheduler.actions().copied().collect();
        assert_eq!(actions, vec!["early", "late"]);
    }
}
