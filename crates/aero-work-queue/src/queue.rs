use std::fmt;

use aero_time::Scheduler;
use tracing::{debug, error, trace, warn};

use crate::config::{AddrRange, WorkQueueConfig};
use crate::error::{Result, WorkQueueError};
use crate::fifo::WorkFifo;
use crate::packet::{Packet, WorkToken, WORD_SIZE};
use crate::port::{PortRole, RequestPort, WorkQueuePort};
use crate::stage::DeferredStage;
use crate::state::{Backpressure, DrainState, PortState, WorkQueueEvent};
use crate::stats::{StatsVisitor, WorkQueueStats};

/// Queue operation selected by the request address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueueOp {
    Push,
    Pop,
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    role: PortRole,
    release_ns: u64,
}

/// Dual-ported bounded work queue with fixed access latency.
///
/// Only one timing operation is outstanding at a time, across both ports: a request is accepted
/// only while no other accepted request is waiting for its release. The FIFO operation itself
/// happens at acceptance; the response is staged and sent `latency_ns` later.
pub struct WorkQueue {
    name: String,
    range: AddrRange,
    pop_addr: u64,
    push_addr: u64,
    latency_ns: u64,
    fifo: WorkFifo,
    stage: DeferredStage,
    in_flight: Option<InFlight>,
    backpressure: [Backpressure; 2],
    peers: [Option<Box<dyn RequestPort>>; 2],
    // A `Deliver` event is pending.
    delivery_armed: bool,
    // The last delivered response. The receiver may still look at it until our next access.
    retained_response: Option<Packet>,
    drain_state: DrainState,
}

#[cold]
fn fatal(err: WorkQueueError) -> ! {
    error!(%err, "work queue protocol violation");
    panic!("{err}");
}

impl WorkQueue {
    pub fn new(config: WorkQueueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pop_addr: config.pop_addr(),
            push_addr: config.push_addr(),
            name: config.name,
            range: config.range,
            latency_ns: config.latency_ns,
            fifo: WorkFifo::new(config.size),
            stage: DeferredStage::new(),
            in_flight: None,
            backpressure: [Backpressure::Clear; 2],
            peers: [None, None],
            delivery_armed: false,
            retained_response: None,
            drain_state: DrainState::Running,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The whole address span owned by this instance.
    pub fn addr_range(&self) -> AddrRange {
        self.range
    }

    pub fn push_addr(&self) -> u64 {
        self.push_addr
    }

    pub fn pop_addr(&self) -> u64 {
        self.pop_addr
    }

    pub fn port_addr_range(&self, role: PortRole) -> AddrRange {
        let addr = match role {
            PortRole::Push => self.push_addr,
            PortRole::Pop => self.pop_addr,
        };
        AddrRange::new(addr, WORD_SIZE)
    }

    /// Wires `peer` to the port of the given role, replacing any previous peer.
    pub fn connect(&mut self, role: PortRole, peer: Box<dyn RequestPort>) {
        self.peers[role.index()] = Some(peer);
    }

    /// Checks that both ports are wired.
    pub fn init(&self) -> Result<()> {
        for role in PortRole::ALL {
            if self.peers[role.index()].is_none() {
                return Err(WorkQueueError::PortNotConnected {
                    name: self.name.clone(),
                    role,
                });
            }
        }
        Ok(())
    }

    pub fn port(&mut self, role: PortRole) -> WorkQueuePort<'_> {
        WorkQueuePort::new(self, role)
    }

    pub fn port_by_name(&mut self, name: &str) -> Result<WorkQueuePort<'_>> {
        let role = PortRole::from_port_name(name)
            .ok_or_else(|| WorkQueueError::UnknownPort(name.to_string()))?;
        Ok(self.port(role))
    }

    pub fn handle_event(
        &mut self,
        event: WorkQueueEvent,
        sched: &mut dyn Scheduler<WorkQueueEvent>,
    ) {
        match event {
            WorkQueueEvent::Release => self.release(sched.now_ns()),
            WorkQueueEvent::Deliver => {
                self.delivery_armed = false;
                self.deliver(sched);
            }
        }
    }

    pub fn latency_for(&self, _pkt: &Packet) -> u64 {
        self.latency_ns
    }

    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fifo.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }

    /// Queued tokens, head first.
    pub fn tokens(&self) -> impl Iterator<Item = WorkToken> + '_ {
        self.fifo.iter()
    }

    /// Number of accepted operations whose response has not been delivered yet.
    pub fn staged_len(&self) -> usize {
        self.stage.len()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn port_state(&self, role: PortRole) -> PortState {
        if let Some(state) = self.backpressure[role.index()].port_state() {
            return state;
        }
        match self.in_flight {
            Some(in_flight) if in_flight.role == role => PortState::Busy,
            _ => PortState::Idle,
        }
    }

    pub fn retained_response(&self) -> Option<&Packet> {
        self.retained_response.as_ref()
    }

    pub fn stats(&self) -> WorkQueueStats {
        self.fifo.stats()
    }

    pub fn reg_stats(&self, visitor: &mut dyn StatsVisitor) {
        self.fifo.stats().visit(&self.name, visitor);
    }

    pub fn drain_state(&self) -> DrainState {
        self.drain_state
    }

    /// Asks the queue to quiesce.
    ///
    /// Returns [`DrainState::Drained`] if nothing is staged, in flight or backpressured.
    /// Otherwise the queue keeps operating and switches to `Drained` by itself from the event
    /// that reaches quiescence.
    pub fn drain(&mut self) -> DrainState {
        self.drain_state = if self.is_quiescent() {
            DrainState::Drained
        } else {
            debug!(
                queue = %self.name,
                staged = self.stage.len(),
                busy = self.in_flight.is_some(),
                "draining"
            );
            DrainState::Draining
        };
        self.drain_state
    }

    pub fn drain_resume(&mut self) {
        self.drain_state = DrainState::Running;
    }

    fn is_quiescent(&self) -> bool {
        self.stage.is_empty()
            && self.in_flight.is_none()
            && self
                .backpressure
                .iter()
                .all(|&b| b == Backpressure::Clear)
    }

    fn check_drained(&mut self) {
        if self.drain_state == DrainState::Draining && self.is_quiescent() {
            debug!(queue = %self.name, "drain complete");
            self.drain_state = DrainState::Drained;
        }
    }

    /// New activity on a drained queue puts it back to `Draining`.
    fn leave_drained(&mut self, role: PortRole, why: &'static str) {
        if self.drain_state == DrainState::Drained {
            warn!(queue = %self.name, %role, "{}", why);
            self.drain_state = DrainState::Draining;
        }
    }

    fn decode(&self, addr: u64) -> QueueOp {
        if addr == self.push_addr {
            QueueOp::Push
        } else if addr == self.pop_addr {
            QueueOp::Pop
        } else {
            fatal(WorkQueueError::AddressDecode {
                name: self.name.clone(),
                addr,
                push_addr: self.push_addr,
                pop_addr: self.pop_addr,
            })
        }
    }

    /// Runs the FIFO operation, turning `pkt` into its response. Hands the request back untouched
    /// when the queue is full (push) or empty (pop).
    fn access(&mut self, op: QueueOp, mut pkt: Packet) -> std::result::Result<Packet, Packet> {
        match op {
            QueueOp::Push => {
                let Some(token) = pkt.data else {
                    fatal(WorkQueueError::MissingPayload {
                        name: self.name.clone(),
                        addr: pkt.addr,
                    })
                };
                if self.fifo.try_push(token).is_err() {
                    return Err(pkt);
                }
                pkt.make_response(None);
            }
            QueueOp::Pop => {
                let Some(token) = self.fifo.try_pop() else {
                    return Err(pkt);
                };
                pkt.make_response(Some(token));
            }
        }
        Ok(pkt)
    }

    pub(crate) fn recv_atomic(&mut self, role: PortRole, pkt: Packet) -> (Packet, u64) {
        self.retained_response = None;
        let op = self.decode(pkt.addr);
        let latency_ns = self.latency_for(&pkt);
        let resp = match self.access(op, pkt) {
            Ok(resp) => resp,
            Err(mut pkt) => {
                trace!(queue = %self.name, %role, ?op, "atomic access nacked");
                pkt.make_nack();
                pkt
            }
        };
        (resp, latency_ns)
    }

    /// Inspects or overwrites the head (pop word) or tail (push word) token without any
    /// protocol or counter effects.
    pub(crate) fn recv_functional(&mut self, pkt: &mut Packet) {
        let op = self.decode(pkt.addr);
        if pkt.cmd.is_write() {
            let slot = match op {
                QueueOp::Pop => self.fifo.front_mut(),
                QueueOp::Push => self.fifo.back_mut(),
            };
            if let (Some(slot), Some(value)) = (slot, pkt.data) {
                *slot = value;
            }
            pkt.make_response(None);
        } else {
            let token = match op {
                QueueOp::Pop => self.fifo.front(),
                QueueOp::Push => self.fifo.back(),
            };
            pkt.make_response(token);
        }
    }

    pub(crate) fn submit(
        &mut self,
        role: PortRole,
        pkt: Packet,
        sched: &mut dyn Scheduler<WorkQueueEvent>,
    ) -> std::result::Result<(), Packet> {
        self.retained_response = None;
        let op = self.decode(pkt.addr);

        if let Some(in_flight) = self.in_flight {
            debug!(
                queue = %self.name,
                %role,
                ?op,
                busy_with = %in_flight.role,
                release_ns = in_flight.release_ns,
                "request rejected: busy"
            );
            self.set_backpressure(role, Backpressure::AwaitingFreeSlot);
            return Err(pkt);
        }

        let latency_ns = self.latency_for(&pkt);
        let resp = match self.access(op, pkt) {
            Ok(resp) => resp,
            Err(pkt) => {
                debug!(
                    queue = %self.name,
                    %role,
                    ?op,
                    len = self.fifo.len(),
                    "request rejected: no free slot"
                );
                self.set_backpressure(role, Backpressure::AwaitingFreeSlot);
                return Err(pkt);
            }
        };

        // Resubmitting ahead of the retry is allowed; admission satisfies it.
        if self.backpressure[role.index()] == Backpressure::AwaitingFreeSlot {
            self.backpressure[role.index()] = Backpressure::Clear;
        }
        self.leave_drained(role, "request accepted while drained");

        let due_ns = sched.now_ns().saturating_add(latency_ns);
        trace!(
            queue = %self.name,
            %role,
            ?op,
            len = self.fifo.len(),
            due_ns,
            "request accepted"
        );
        self.in_flight = Some(InFlight {
            role,
            release_ns: due_ns,
        });
        sched.schedule_at(due_ns, WorkQueueEvent::Release);
        self.stage.stage(resp, role, due_ns);
        self.arm_delivery(sched);
        Ok(())
    }

    fn release(&mut self, now_ns: u64) {
        let Some(in_flight) = self.in_flight.take() else {
            warn!(queue = %self.name, now_ns, "release without an operation in flight");
            return;
        };
        trace!(queue = %self.name, role = %in_flight.role, now_ns, "released");

        for role in PortRole::ALL {
            if self.backpressure[role.index()] != Backpressure::AwaitingFreeSlot {
                continue;
            }
            self.backpressure[role.index()] = Backpressure::Clear;
            debug!(queue = %self.name, %role, "sending request retry");
            self.peer_mut(role).recv_req_retry();
        }
        self.check_drained();
    }

    /// Tries to send the head of the stage if it is due.
    fn deliver(&mut self, sched: &mut dyn Scheduler<WorkQueueEvent>) {
        let now_ns = sched.now_ns();
        let Some(entry) = self.stage.peek_due(now_ns) else {
            self.arm_delivery(sched);
            return;
        };

        let role = entry.role;
        let accepted = match self.peers[role.index()].as_deref_mut() {
            Some(peer) => peer.recv_timing_resp(&entry.packet),
            None => fatal(WorkQueueError::PortNotConnected {
                name: self.name.clone(),
                role,
            }),
        };
        if !accepted {
            debug!(queue = %self.name, %role, "response refused, awaiting retry");
            self.set_backpressure(role, Backpressure::AwaitingRespAck);
            return;
        }

        if let Some(entry) = self.stage.pop_due(now_ns) {
            trace!(
                queue = %self.name,
                %role,
                due_ns = entry.due_ns,
                now_ns,
                "response delivered"
            );
            self.retained_response = Some(entry.packet);
        }
        self.arm_delivery(sched);
        self.check_drained();
    }

    pub(crate) fn resume_delivery(
        &mut self,
        role: PortRole,
        sched: &mut dyn Scheduler<WorkQueueEvent>,
    ) {
        if self.backpressure[role.index()] != Backpressure::AwaitingRespAck {
            fatal(WorkQueueError::UnsolicitedResume {
                name: self.name.clone(),
                role,
            });
        }
        self.backpressure[role.index()] = Backpressure::Clear;
        debug!(queue = %self.name, %role, "resending refused response");
        self.deliver(sched);
    }

    /// Schedules delivery of the stage head unless one is already scheduled or a refused response
    /// is blocking the stage.
    fn arm_delivery(&mut self, sched: &mut dyn Scheduler<WorkQueueEvent>) {
        if self.delivery_armed || self.delivery_blocked() {
            return;
        }
        if let Some(due_ns) = self.stage.next_due_ns() {
            let at_ns = due_ns.max(sched.now_ns());
            sched.schedule_at(at_ns, WorkQueueEvent::Deliver);
            self.delivery_armed = true;
        }
    }

    fn delivery_blocked(&self) -> bool {
        self.backpressure
            .iter()
            .any(|&b| b == Backpressure::AwaitingRespAck)
    }

    fn set_backpressure(&mut self, role: PortRole, next: Backpressure) {
        let current = self.backpressure[role.index()];
        if let (Some(pending), Some(requested)) = (current.port_state(), next.port_state()) {
            fatal(WorkQueueError::OverlappingRetry {
                name: self.name.clone(),
                role,
                pending,
                requested,
            });
        }
        self.backpressure[role.index()] = next;
        self.leave_drained(role, "backpressure recorded while drained");
    }

    fn peer_mut(&mut self, role: PortRole) -> &mut dyn RequestPort {
        match self.peers[role.index()].as_deref_mut() {
            Some(peer) => peer,
            None => fatal(WorkQueueError::PortNotConnected {
                name: self.name.clone(),
                role,
            }),
        }
    }
}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.name)
            .field("range", &self.range)
            .field("latency_ns", &self.latency_ns)
            .field("fifo", &self.fifo)
            .field("stage", &self.stage)
            .field("in_flight", &self.in_flight)
            .field("backpressure", &self.backpressure)
            .field("drain_state", &self.drain_state)
            .finish_non_exhaustive()
    }
}
