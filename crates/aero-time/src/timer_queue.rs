use std::collections::BTreeMap;

/// Identifies a scheduled timer; ids are handed out in scheduling order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerEvent<T> {
    pub id: TimerId,
    pub deadline_ns: u64,
    pub payload: T,
}

/// One-shot timers ordered by deadline.
///
/// Timers with the same deadline fire in the order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<T> {
    // Keyed by (deadline, sequence) so iteration order is firing order.
    entries: BTreeMap<(u64, u64), T>,
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, deadline_ns: u64, payload: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        self.entries.insert((deadline_ns, seq), payload);
        id
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.keys().next().map(|&(deadline_ns, _)| deadline_ns)
    }

    /// Removes and returns the earliest timer whose deadline is `<= now_ns`.
    pub fn pop_due(&mut self, now_ns: u64) -> Option<TimerEvent<T>> {
        let first = self.entries.first_entry()?;
        let (deadline_ns, seq) = *first.key();
        if deadline_ns > now_ns {
            return None;
        }
        let payload = first.remove();
        Some(TimerEvent {
            id: TimerId(seq),
            deadline_ns,
            payload,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
