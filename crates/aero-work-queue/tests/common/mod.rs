#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use aero_time::{EventLoop, Scheduler};
use aero_work_queue::{
    AddrRange, Packet, PortRole, RequestPort, WorkQueue, WorkQueueConfig, WorkQueueEvent,
    WorkToken,
};

pub const BASE: u64 = 0x1000_0000;
pub const POP_ADDR: u64 = BASE;
pub const PUSH_ADDR: u64 = BASE + 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub seq: u64,
    pub at_ns: u64,
    pub packet: Packet,
}

#[derive(Debug, Default)]
pub struct PeerLog {
    pub responses: Vec<Delivery>,
    pub retries: Vec<u64>,
    /// Number of upcoming responses to refuse.
    pub refuse: usize,
    pub refused: Vec<Packet>,
}

/// Peer that records everything it is offered.
struct RecordingPeer {
    log: Rc<RefCell<PeerLog>>,
    now: Rc<Cell<u64>>,
    seq: Rc<Cell<u64>>,
}

impl RequestPort for RecordingPeer {
    fn recv_timing_resp(&mut self, pkt: &Packet) -> bool {
        let mut log = self.log.borrow_mut();
        if log.refuse > 0 {
            log.refuse -= 1;
            log.refused.push(pkt.clone());
            return false;
        }
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        log.responses.push(Delivery {
            seq,
            at_ns: self.now.get(),
            packet: pkt.clone(),
        });
        true
    }

    fn recv_req_retry(&mut self) {
        self.log.borrow_mut().retries.push(self.now.get());
    }
}

pub struct Harness {
    pub wq: WorkQueue,
    pub ev: EventLoop<WorkQueueEvent>,
    pub push_log: Rc<RefCell<PeerLog>>,
    pub pop_log: Rc<RefCell<PeerLog>>,
    now: Rc<Cell<u64>>,
}

impl Harness {
    pub fn new(size: usize, latency_ns: u64) -> Self {
        let cfg = WorkQueueConfig::new(size, latency_ns, AddrRange::new(BASE, 0x10))
            .with_name("wq0");
        let mut wq = WorkQueue::new(cfg).unwrap();

        let now = Rc::new(Cell::new(0));
        let seq = Rc::new(Cell::new(0));
        let push_log = Rc::new(RefCell::new(PeerLog::default()));
        let pop_log = Rc::new(RefCell::new(PeerLog::default()));
        for (role, log) in [(PortRole::Push, &push_log), (PortRole::Pop, &pop_log)] {
            wq.connect(
                role,
                Box::new(RecordingPeer {
                    log: Rc::clone(log),
                    now: Rc::clone(&now),
                    seq: Rc::clone(&seq),
                }),
            );
        }
        wq.init().unwrap();

        Self {
            wq,
            ev: EventLoop::new(),
            push_log,
            pop_log,
            now,
        }
    }

    pub fn now(&self) -> u64 {
        self.ev.now_ns()
    }

    pub fn log(&self, role: PortRole) -> &Rc<RefCell<PeerLog>> {
        match role {
            PortRole::Push => &self.push_log,
            PortRole::Pop => &self.pop_log,
        }
    }

    pub fn push(&mut self, token: WorkToken) -> Result<(), Packet> {
        self.wq
            .port(PortRole::Push)
            .recv_timing_req(Packet::write(PUSH_ADDR, token), &mut self.ev)
    }

    pub fn pop(&mut self) -> Result<(), Packet> {
        self.wq
            .port(PortRole::Pop)
            .recv_timing_req(Packet::read(POP_ADDR), &mut self.ev)
    }

    pub fn resume(&mut self, role: PortRole) {
        self.now.set(self.ev.now_ns());
        self.wq.port(role).recv_resp_retry(&mut self.ev);
    }

    /// Dispatches every event due at or before `t_ns`, then moves time to `t_ns`.
    pub fn run_until(&mut self, t_ns: u64) {
        while let Some(event) = self.ev.next_event_until(t_ns) {
            self.now.set(event.deadline_ns);
            self.wq.handle_event(event.payload, &mut self.ev);
        }
        if t_ns > self.ev.now_ns() {
            self.ev.advance_to(t_ns);
        }
        self.now.set(self.ev.now_ns());
    }

    pub fn run_to_idle(&mut self) {
        while let Some(event) = self.ev.next_event() {
            self.now.set(event.deadline_ns);
            self.wq.handle_event(event.payload, &mut self.ev);
        }
        self.now.set(self.ev.now_ns());
    }

    pub fn response_tokens(&self, role: PortRole) -> Vec<Option<WorkToken>> {
        self.log(role)
            .borrow()
            .responses
            .iter()
            .map(|d| d.packet.data)
            .collect()
    }

    pub fn response_times(&self, role: PortRole) -> Vec<u64> {
        self.log(role)
            .borrow()
            .responses
            .iter()
            .map(|d| d.at_ns)
            .collect()
    }
}
