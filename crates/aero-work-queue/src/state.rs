//! Per-port protocol state and device lifecycle state.

/// Observable protocol state of one port role.
///
/// `Busy` means the role owns the single in-flight operation. The two `Awaiting*` states are the
/// backpressure conditions; at most one of them can be pending per role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortState {
    Idle,
    Busy,
    /// A request from this role was rejected at admission; the peer gets a retry once the queue
    /// releases.
    AwaitingFreeSlot,
    /// The peer refused a response; delivery stalls until the peer asks for a resend.
    AwaitingRespAck,
}

/// Backpressure condition recorded for a role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Backpressure {
    #[default]
    Clear,
    AwaitingFreeSlot,
    AwaitingRespAck,
}

impl Backpressure {
    pub(crate) fn port_state(self) -> Option<PortState> {
        match self {
            Self::Clear => None,
            Self::AwaitingFreeSlot => Some(PortState::AwaitingFreeSlot),
            Self::AwaitingRespAck => Some(PortState::AwaitingRespAck),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainState {
    Running,
    /// Quiescence was requested but operations are still in flight.
    Draining,
    /// No staged responses, no in-flight operation, no pending backpressure.
    Drained,
}

/// Events the work queue schedules for itself. The host hands them back through
/// [`crate::WorkQueue::handle_event`] when their deadline is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkQueueEvent {
    /// End of the busy period of the in-flight operation.
    Release,
    /// The head of the deferred stage is due for delivery.
    Deliver,
}
