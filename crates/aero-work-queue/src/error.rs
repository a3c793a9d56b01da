use thiserror::Error;

use crate::port::PortRole;
use crate::state::PortState;

pub type Result<T> = std::result::Result<T, WorkQueueError>;

/// Errors raised by the work queue.
///
/// Configuration and wiring problems are returned to the caller. Protocol violations by a
/// connected peer are unrecoverable: the queue logs them and panics with this type's `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkQueueError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("{name}: {role} port is not connected")]
    PortNotConnected { name: String, role: PortRole },

    #[error("no port named `{0}` (expected `push_port` or `pop_port`)")]
    UnknownPort(String),

    #[error("{name}: address {addr:#x} is neither the push word ({push_addr:#x}) nor the pop word ({pop_addr:#x})")]
    AddressDecode {
        name: String,
        addr: u64,
        push_addr: u64,
        pop_addr: u64,
    },

    #[error("{name}: push request to {addr:#x} carries no work token")]
    MissingPayload { name: String, addr: u64 },

    #[error("{name}: {role} port entered {requested:?} while still {pending:?}")]
    OverlappingRetry {
        name: String,
        role: PortRole,
        pending: PortState,
        requested: PortState,
    },

    #[error("{name}: response retry on {role} port without a refused response")]
    UnsolicitedResume { name: String, role: PortRole },
}
