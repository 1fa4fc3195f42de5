//! Debounce and throttle wrappers driven by the page [`Scheduler`].

use crate::timer::{Millis, Scheduler, TimerId};

/// Delays a value until calls pause for `wait` milliseconds.
///
/// Every [`call`](Self::call) cancels the previous pending timer and stores
/// the newest value; only the value present when the timer expires is
/// released by [`fire`](Self::fire).
#[derive(Debug)]
pub struct Debounce<T> {
    wait: Millis,
    pending: Option<(TimerId, T)>,
}

impl<T> Debounce<T> {
    pub fn new(wait: Millis) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    pub fn call(&mut self, scheduler: &mut Scheduler, value: T) {
        self.cancel(scheduler);
        let id = scheduler.schedule(self.wait);
        self.pending = Some((id, value));
    }

    /// Release the pending value if `timer` is the one this debounce armed.
    pub fn fire(&mut self, timer: TimerId) -> Option<T> {
        match &self.pending {
            Some((id, _)) if *id == timer => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self, scheduler: &mut Scheduler) {
        if let Some((id, _)) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Admits at most one call per `limit` milliseconds (leading edge).
#[derive(Debug, Clone)]
pub struct Throttle {
    limit: Millis,
    reopens_at: Option<Millis>,
}

impl Throttle {
    pub fn new(limit: Millis) -> Self {
        Self {
            limit,
            reopens_at: None,
        }
    }

    /// Returns `true` when a call at `now` may run, and closes the window.
    pub fn admit(&mut self, now: Millis) -> bool {
        match self.reopens_at {
            Some(at) if now < at => false,
            _ => {
                self.reopens_at = Some(now.saturating_add(self.limit));
                true
            }
        }
    }

    /// Milliseconds until the window reopens; zero when already open.
    pub fn remaining(&self, now: Millis) -> Millis {
        self.reopens_at.map_or(0, |at| at.saturating_sub(now))
    }
}
