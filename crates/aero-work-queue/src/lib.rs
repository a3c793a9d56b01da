//! Dual-ported, timing-accurate work queue device.
//!
//! The queue buffers opaque 32-bit work tokens. Producers push through the push port by writing
//! a token to the queue's push word; consumers pop through the pop port by reading the pop word.
//! Every accepted timing request occupies the whole device for a fixed latency, and its response
//! is delivered to the requesting peer when that latency has elapsed.
//!
//! Flow control follows a retry handshake:
//! - A request arriving while the device is busy, or a push to a full / pop from an empty queue,
//!   is rejected and the packet handed back. The peer receives [`RequestPort::recv_req_retry`]
//!   after the next release of the device.
//! - A peer that refuses a response must later call [`WorkQueuePort::recv_resp_retry`]; the same
//!   response is then resent. Later responses wait behind it.
//!
//! Time is injected: the device schedules its own [`WorkQueueEvent`]s through an
//! [`aero_time::Scheduler`], and the host feeds them back via [`WorkQueue::handle_event`].

mod config;
mod error;
mod fifo;
mod packet;
mod port;
mod queue;
mod stage;
mod state;
mod stats;

pub use config::{AddrRange, WorkQueueConfig};
pub use error::{Result, WorkQueueError};
pub use fifo::WorkFifo;
pub use packet::{MemCmd, Packet, WorkToken, WORD_SIZE};
pub use port::{PortRole, RequestPort, WorkQueuePort};
pub use queue::WorkQueue;
pub use stage::{DeferredEntry, DeferredStage};
pub use state::{DrainState, PortState, WorkQueueEvent};
pub use stats::{StatsVisitor, WorkQueueStats};
