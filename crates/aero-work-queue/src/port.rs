use std::fmt;

use aero_time::Scheduler;

use crate::config::AddrRange;
use crate::packet::Packet;
use crate::queue::WorkQueue;
use crate::state::WorkQueueEvent;

/// Which side of the queue a port faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortRole {
    /// Producer-facing.
    Push,
    /// Consumer-facing.
    Pop,
}

impl PortRole {
    pub const ALL: [PortRole; 2] = [PortRole::Push, PortRole::Pop];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Push => 0,
            Self::Pop => 1,
        }
    }

    /// Name the port is resolved by when wiring.
    pub const fn port_name(self) -> &'static str {
        match self {
            Self::Push => "push_port",
            Self::Pop => "pop_port",
        }
    }

    pub fn from_port_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.port_name() == name)
    }
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Push => "push",
            Self::Pop => "pop",
        })
    }
}

/// The requesting peer wired to one of the queue's ports.
///
/// Callbacks run inside the queue's own event handling. Implementations must not call back into
/// the queue from them; a retry or a resend request is issued by the host afterwards.
pub trait RequestPort {
    /// Offers a response. Returning `false` refuses it and obliges the peer to later call
    /// [`WorkQueuePort::recv_resp_retry`], which resends the same response.
    fn recv_timing_resp(&mut self, pkt: &Packet) -> bool;

    /// A request this peer had rejected may now be resubmitted.
    fn recv_req_retry(&mut self);
}

/// One of the queue's two response ports.
///
/// Both ports share the same protocol logic; the role only selects which peer receives responses
/// and retries and which address the port advertises.
pub struct WorkQueuePort<'a> {
    queue: &'a mut WorkQueue,
    role: PortRole,
}

impl<'a> WorkQueuePort<'a> {
    pub(crate) fn new(queue: &'a mut WorkQueue, role: PortRole) -> Self {
        Self { queue, role }
    }

    pub fn role(&self) -> PortRole {
        self.role
    }

    pub fn name(&self) -> &'static str {
        self.role.port_name()
    }

    /// Performs the access immediately and returns the response with its informational latency.
    pub fn recv_atomic(&mut self, pkt: Packet) -> (Packet, u64) {
        self.queue.recv_atomic(self.role, pkt)
    }

    pub fn recv_functional(&mut self, pkt: &mut Packet) {
        self.queue.recv_functional(pkt);
    }

    /// Offers a timing request. On rejection the packet is handed back and the peer will receive
    /// [`RequestPort::recv_req_retry`] once it may try again.
    pub fn recv_timing_req(
        &mut self,
        pkt: Packet,
        sched: &mut dyn Scheduler<WorkQueueEvent>,
    ) -> Result<(), Packet> {
        self.queue.submit(self.role, pkt, sched)
    }

    pub fn recv_resp_retry(&mut self, sched: &mut dyn Scheduler<WorkQueueEvent>) {
        self.queue.resume_delivery(self.role, sched);
    }

    /// The single word this port answers for.
    pub fn addr_range(&self) -> AddrRange {
        self.queue.port_addr_range(self.role)
    }
}
