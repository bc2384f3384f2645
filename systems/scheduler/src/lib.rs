#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic timer facility driven by simulated time.
//!
//! Systems never sleep. They register one-shot or repeating timers keyed by a
//! small `Copy` value, feed the simulated clock forward as `TimeAdvanced`
//! events arrive, and react to the keys that fall due. Timers that share a
//! deadline fire in registration order so replays stay reproducible.

use std::time::Duration;

/// Shortest period accepted for repeating timers.
///
/// A zero period would fire forever within a single advance.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle returned when a timer is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Simulated-time scheduler offering "once after" and "every" callbacks.
#[derive(Debug)]
pub struct Scheduler<K> {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer<K>>,
}

#[derive(Clone, Debug)]
struct Timer<K> {
    id: TimerId,
    key: K,
    deadline: Duration,
    period: Option<Duration>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            timers: Vec::new(),
        }
    }
}

impl<K: Copy> Scheduler<K> {
    /// Creates an empty scheduler whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers still waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Registers a timer that fires once after `delay`.
    pub fn after(&mut self, delay: Duration, key: K) -> TimerId {
        self.register(delay, None, key)
    }

    /// Registers a timer that fires every `period` until cancelled.
    ///
    /// The first firing happens one full period from now.
    pub fn every(&mut self, period: Duration, key: K) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.register(period, Some(period), key)
    }

    /// Cancels a timer, returning whether it was still pending.
    ///
    /// Cancelling an unknown or already-fired one-shot timer is a no-op.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        before != self.timers.len()
    }

    /// Reports whether the timer is still registered.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    /// Drops every registered timer without firing it.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Fires the earliest timer due at or before `until`, if any.
    ///
    /// The clock moves to the fired timer's deadline so callbacks that
    /// register follow-up timers schedule them relative to the firing
    /// instant. Callers loop on `poll` and finish with [`Scheduler::settle`].
    pub fn poll(&mut self, until: Duration) -> Option<K> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= until)
            .min_by_key(|(_, timer)| (timer.deadline, timer.id))
            .map(|(index, _)| index)?;

        let Timer {
            key,
            deadline,
            period,
            ..
        } = self.timers[index];
        self.now = self.now.max(deadline);

        match period {
            Some(period) => {
                self.timers[index].deadline = deadline.saturating_add(period);
            }
            None => {
                let _ = self.timers.remove(index);
            }
        }

        Some(key)
    }

    /// Moves the clock forward to `until` once every due timer has fired.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Advances the clock by `dt`, collecting every key that fell due.
    pub fn advance(&mut self, dt: Duration, fired: &mut Vec<K>) {
        let until = self.now.saturating_add(dt);
        while let Some(key) = self.poll(until) {
            fired.push(key);
        }
        self.settle(until);
    }

    fn register(&mut self, delay: Duration, period: Option<Duration>, key: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.timers.push(Timer {
            id,
            key,
            deadline: self.now.saturating_add(delay),
            period,
        });
        log::trace!("timer {} registered, due in {:?}", id.get(), delay);
        id
    }
}
