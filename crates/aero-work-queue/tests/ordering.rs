mod common;

use aero_work_queue::{PortRole, WorkToken};
use common::Harness;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Push(WorkToken),
    Pop,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![any::<WorkToken>().prop_map(Op::Push), Just(Op::Pop)]
}

proptest! {
    // Requests issued only while the queue is idle come back in submission order, each exactly
    // `latency` after it was accepted, and pops return tokens in push order.
    #[test]
    fn idle_submissions_are_delivered_in_order(
        size in 1usize..6,
        latency in 0u64..20,
        ops in proptest::collection::vec((arb_op(), 0u64..30), 1..64),
    ) {
        let mut h = Harness::new(size, latency);
        let mut model = std::collections::VecDeque::new();
        let mut expected = Vec::new();
        let mut idle_at = 0u64;

        for (op, gap) in ops {
            let t = (h.now() + gap).max(idle_at);
            h.run_until(t);
            prop_assert!(!h.wq.is_busy());

            match op {
                Op::Push(token) if model.len() < size => {
                    prop_assert!(h.push(token).is_ok());
                    model.push_back(token);
                    expected.push((PortRole::Push, t + latency, None));
                }
                Op::Pop if !model.is_empty() => {
                    prop_assert!(h.pop().is_ok());
                    let token = model.pop_front();
                    expected.push((PortRole::Pop, t + latency, token));
                }
                // Would be rejected; skipping keeps the run free of backpressure.
                _ => continue,
            }
            idle_at = t + latency;

            prop_assert!(h.wq.len() <= h.wq.capacity());
            prop_assert_eq!(h.wq.len(), model.len());
            prop_assert_eq!(h.wq.is_empty(), model.is_empty());
            prop_assert_eq!(h.wq.is_full(), model.len() == size);
        }
        h.run_to_idle();

        let mut delivered = Vec::new();
        for role in PortRole::ALL {
            for d in &h.log(role).borrow().responses {
                delivered.push((d.seq, role, d.at_ns, d.packet.data));
            }
        }
        delivered.sort_by_key(|&(seq, ..)| seq);
        let delivered: Vec<_> = delivered
            .into_iter()
            .map(|(_, role, at_ns, data)| (role, at_ns, data))
            .collect();
        prop_assert_eq!(delivered, expected);
        prop_assert_eq!(h.wq.staged_len(), 0);
    }
}
