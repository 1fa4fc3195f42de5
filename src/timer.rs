//! Single-threaded virtual clock with cancellable one-shot timers.
//!
//! The page runtime never sleeps. Time only moves when the host calls
//! [`Scheduler::pop_due`] (normally through `Page::advance`), which hands
//! back expired timers one at a time in deadline order so that handlers
//! may schedule further timers that fall inside the same window.

use std::collections::BTreeMap;

/// Milliseconds since page load.
pub type Millis = u64;

/// Opaque handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Millis,
    next_id: u64,
    /// Keyed by `(deadline, id)` so ties fire in scheduling order.
    queue: BTreeMap<(Millis, u64), TimerId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Schedule a timer that expires `delay` milliseconds from now.
    pub fn schedule(&mut self, delay: Millis) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((self.now.saturating_add(delay), id.0), id);
        id
    }

    /// Cancel a pending timer. Returns `false` when it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.queue.iter().find(|(_, v)| **v == id).map(|(k, _)| *k);
        match key {
            Some(k) => self.queue.remove(&k).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.values().any(|v| *v == id)
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Returns `None` (and leaves the clock alone) when nothing
    /// is due.
    pub fn pop_due(&mut self, until: Millis) -> Option<TimerId> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        let id = self.queue.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(id)
    }

    /// Move the clock forward without firing anything. Callers drain
    /// [`pop_due`](Self::pop_due) first.
    pub fn set_now(&mut self, now: Millis) {
        self.now = self.now.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_pop_in_deadline_order() {
        let mut s = Scheduler::new();
        let late = s.schedule(50);
        let early = s.schedule(10);
        assert_eq!(s.pop_due(100), Some(early));
        assert_eq!(s.now(), 10);
        assert_eq!(s.pop_due(100), Some(late));
        assert_eq!(s.now(), 50);
        assert_eq!(s.pop_due(100), None);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        let a = s.schedule(5);
        let b = s.schedule(5);
        assert_eq!(s.pop_due(5), Some(a));
        assert_eq!(s.pop_due(5), Some(b));
    }

    #[test]
    fn timer_not_due_stays_queued() {
        let mut s = Scheduler::new();
        let id = s.schedule(100);
        assert_eq!(s.pop_due(99), None);
        assert!(s.is_pending(id));
        assert_eq!(s.now(), 0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut s = Scheduler::new();
        let id = s.schedule(10);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert_eq!(s.pop_due(1000), None);
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut s = Scheduler::new();
        s.set_now(40);
        s.set_now(20);
        assert_eq!(s.now(), 40);
        let id = s.schedule(0);
        assert_eq!(s.next_deadline(), Some(40));
        assert_eq!(s.pop_due(40), Some(id));
    }
}
