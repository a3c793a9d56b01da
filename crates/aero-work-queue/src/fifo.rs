use std::collections::VecDeque;

use crate::packet::WorkToken;
use crate::stats::WorkQueueStats;

/// Bounded FIFO of work tokens.
///
/// Emptiness and fullness are derived from the length on every query. Successful pushes and pops
/// bump the counters; peeks and in-place overwrites do not.
#[derive(Debug, Clone)]
pub struct WorkFifo {
    items: VecDeque<WorkToken>,
    capacity: usize,
    stats: WorkQueueStats,
}

impl WorkFifo {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity != 0, "work FIFO capacity must be non-zero");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            stats: WorkQueueStats::default(),
        }
    }

    /// Appends `token`, handing it back if the FIFO is full.
    pub fn try_push(&mut self, token: WorkToken) -> Result<(), WorkToken> {
        if self.is_full() {
            return Err(token);
        }
        self.items.push_back(token);
        self.stats.pushes += 1;
        Ok(())
    }

    pub fn try_pop(&mut self) -> Option<WorkToken> {
        let token = self.items.pop_front()?;
        self.stats.pops += 1;
        Some(token)
    }

    pub fn front(&self) -> Option<WorkToken> {
        self.items.front().copied()
    }

    pub fn back(&self) -> Option<WorkToken> {
        self.items.back().copied()
    }

    pub fn front_mut(&mut self) -> Option<&mut WorkToken> {
        self.items.front_mut()
    }

    pub fn back_mut(&mut self) -> Option<&mut WorkToken> {
        self.items.back_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = WorkToken> + '_ {
        self.items.iter().copied()
    }

    pub fn stats(&self) -> WorkQueueStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn push_rejected_when_full_pop_rejected_when_empty() {
        let mut fifo = WorkFifo::new(2);
        assert!(fifo.try_pop().is_none());

        fifo.try_push(1).unwrap();
        fifo.try_push(2).unwrap();
        assert!(fifo.is_full());
        assert_eq!(fifo.try_push(3), Err(3));
        assert_eq!(fifo.iter().collect::<Vec<_>>(), vec![1, 2]);

        assert_eq!(fifo.try_pop(), Some(1));
        assert_eq!(fifo.try_pop(), Some(2));
        assert!(fifo.is_empty());
        assert_eq!(fifo.stats(), WorkQueueStats { pushes: 2, pops: 2 });
    }

    #[test]
    fn overwrites_do_not_count() {
        let mut fifo = WorkFifo::new(4);
        fifo.try_push(10).unwrap();
        fifo.try_push(20).unwrap();

        *fifo.front_mut().unwrap() = 11;
        *fifo.back_mut().unwrap() = 21;
        assert_eq!((fifo.front(), fifo.back()), (Some(11), Some(21)));
        assert_eq!(fifo.stats(), WorkQueueStats { pushes: 2, pops: 0 });
    }

    #[derive(Clone, Debug)]
    enum Op {
        Push(WorkToken),
        Pop,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![any::<WorkToken>().prop_map(Op::Push), Just(Op::Pop)]
    }

    proptest! {
        #[test]
        fn length_stays_within_capacity(
            capacity in 1usize..8,
            ops in proptest::collection::vec(arb_op(), 0..128),
        ) {
            let mut fifo = WorkFifo::new(capacity);
            let mut model = VecDeque::new();

            for op in ops {
                match op {
                    Op::Push(token) => {
                        let accepted = fifo.try_push(token).is_ok();
                        prop_assert_eq!(accepted, model.len() < capacity);
                        if accepted {
                            model.push_back(token);
                        }
                    }
                    Op::Pop => prop_assert_eq!(fifo.try_pop(), model.pop_front()),
                }

                prop_assert!(fifo.len() <= fifo.capacity());
                prop_assert_eq!(fifo.is_empty(), fifo.len() == 0);
                prop_assert_eq!(fifo.is_full(), fifo.len() == capacity);
            }
        }
    }
}
