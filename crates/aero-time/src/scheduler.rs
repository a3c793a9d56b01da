use crate::clock::Clock;
use crate::timer_queue::{TimerEvent, TimerId, TimerQueue};

/// Scheduling capability handed to device models.
///
/// Devices receive this as an explicit argument instead of reaching for a global event queue,
/// so they can be driven by a real machine loop or by a test harness alike.
pub trait Scheduler<T> {
    fn now_ns(&self) -> u64;

    /// Schedules `payload` for delivery at `deadline_ns`. Deadlines in the past are delivered at
    /// the current time.
    fn schedule_at(&mut self, deadline_ns: u64, payload: T) -> TimerId;
}

/// A [`Clock`] paired with a [`TimerQueue`].
///
/// The loop never invokes anything itself; the host pulls due events with
/// [`EventLoop::next_event`] and dispatches them to whichever device owns the payload.
#[derive(Debug)]
pub struct EventLoop<T> {
    clock: Clock,
    timers: TimerQueue<T>,
}

impl<T> EventLoop<T> {
    pub fn new() -> Self {
        Self {
            clock: Clock::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn timers(&self) -> &TimerQueue<T> {
        &self.timers
    }

    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Pops the earliest pending event, advancing the clock to its deadline.
    pub fn next_event(&mut self) -> Option<TimerEvent<T>> {
        self.next_event_until(u64::MAX)
    }

    /// Like [`Self::next_event`], but only returns events due at or before `limit_ns`.
    pub fn next_event_until(&mut self, limit_ns: u64) -> Option<TimerEvent<T>> {
        let deadline_ns = self.timers.next_deadline()?;
        if deadline_ns > limit_ns {
            return None;
        }
        if deadline_ns > self.clock.now_ns() {
            self.clock.advance_to(deadline_ns);
        }
        self.timers.pop_due(self.clock.now_ns())
    }

    /// Moves virtual time forward to `now_ns` without firing anything.
    ///
    /// # Panics
    ///
    /// Panics if an event is pending before `now_ns`; callers must dispatch it first.
    pub fn advance_to(&mut self, now_ns: u64) {
        if let Some(deadline_ns) = self.timers.next_deadline() {
            assert!(
                deadline_ns >= now_ns,
                "advancing to {now_ns} would skip an event due at {deadline_ns}"
            );
        }
        self.clock.advance_to(now_ns);
    }
}

impl<T> Default for EventLoop<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> for EventLoop<T> {
    fn now_ns(&self) -> u64 {
        self.clock.now_ns()
    }

    fn schedule_at(&mut self, deadline_ns: u64, payload: T) -> TimerId {
        let deadline_ns = deadline_ns.max(self.clock.now_ns());
        self.timers.schedule(deadline_ns, payload)
    }
}
