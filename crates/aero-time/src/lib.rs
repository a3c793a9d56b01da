//! Virtual time and event scheduling primitives for device models.
//!
//! Device models never read a host clock. They are driven by **virtual time** (monotonic
//! nanoseconds since reset) owned by an [`EventLoop`], and they request future work by
//! scheduling events through the [`Scheduler`] trait.
//!
//! The timer queue uses **event delivery** rather than storing callbacks: a scheduled event is a
//! plain payload value that the host hands back to the device when its deadline is reached. This
//! keeps the queue inspectable and lets unit tests drive devices deterministically.

mod clock;
mod scheduler;
mod timer_queue;

pub use clock::Clock;
pub use scheduler::{EventLoop, Scheduler};
pub use timer_queue::{TimerEvent, TimerId, TimerQueue};
