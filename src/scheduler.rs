//! Cancellable timers for a single-threaded host loop.
//!
//! The scheduler keeps its own clock: the host advances it by the time that
//! passed and gets back the tasks that came due, in the order they were due.
//! Tasks due at the same instant fire in the order they were scheduled.

use std::time::Duration;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Repeat {
    Once,
    Every(Duration),
}

#[derive(Debug)]
struct Entry<T> {
    handle: TaskHandle,
    due: Duration,
    /// Tie-breaker for equal `due` times.
    sequence: u64,
    repeat: Repeat,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    next_sequence: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_sequence: 0,
            entries: Vec::new(),
        }
    }

    /// Time elapsed on the scheduler's clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, due: Duration, repeat: Repeat, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(Entry {
            handle,
            due,
            sequence,
            repeat,
            task,
        });
        handle
    }

    /// Runs `task` once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TaskHandle {
        self.push(self.now + delay, Repeat::Once, task)
    }

    /// Runs `task` every `interval`, first after one interval.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn schedule_repeating(&mut self, interval: Duration, task: T) -> TaskHandle {
        assert!(!interval.is_zero(), "repeating task needs a non-zero interval");
        self.push(self.now + interval, Repeat::Every(interval), task)
    }

    /// Stops a task. Returns `false` if it had already finished or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Cancels everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn next_due(&self, limit: Duration) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= limit)
            .min_by_key(|(_, entry)| (entry.due, entry.sequence))
            .map(|(index, _)| index)
    }
}

impl<T: Clone> Scheduler<T> {
    /// Takes the earliest firing due no later than `until` and moves the
    /// clock to its due time, so anything scheduled while handling it is
    /// timed from that instant. A repeating task is re-armed one interval
    /// later. Returns `None` once nothing else is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskHandle, T)> {
        let index = self.next_due(until)?;
        let due = self.entries[index].due;
        self.now = self.now.max(due);
        match self.entries[index].repeat {
            Repeat::Once => {
                let entry = self.entries.swap_remove(index);
                Some((entry.handle, entry.task))
            }
            Repeat::Every(interval) => {
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                let entry = &mut self.entries[index];
                entry.due = due + interval;
                entry.sequence = sequence;
                Some((entry.handle, entry.task.clone()))
            }
        }
    }

    /// Moves the clock to `until` without firing anything still pending.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Moves the clock forward by `elapsed` and returns every firing that
    /// happened in between. A repeating task fires once per elapsed interval.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<(TaskHandle, T)> {
        let until = self.now + elapsed;
        let fired: Vec<_> = std::iter::from_fn(|| self.pop_due(until)).collect();
        self.advance_to(until);
        fired
    }
}
