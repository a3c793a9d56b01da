use std::collections::VecDeque;

use crate::packet::Packet;
use crate::port::PortRole;

/// A response waiting out its latency before being sent back through `role`'s port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeferredEntry {
    pub due_ns: u64,
    pub packet: Packet,
    pub role: PortRole,
}

/// Time-ordered staging area for accepted operations.
///
/// Latency is a fixed per-instance constant applied at acceptance time, so append order is due
/// order and a plain FIFO suffices. A variable latency would need a priority structure keyed by
/// `due_ns` instead.
#[derive(Debug, Default)]
pub struct DeferredStage {
    entries: VecDeque<DeferredEntry>,
}

impl DeferredStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if `due_ns` is earlier than the currently last entry.
    pub fn stage(&mut self, packet: Packet, role: PortRole, due_ns: u64) {
        if let Some(last) = self.entries.back() {
            assert!(
                due_ns >= last.due_ns,
                "deferred entry due at {due_ns} staged behind one due at {}",
                last.due_ns
            );
        }
        self.entries.push_back(DeferredEntry {
            due_ns,
            packet,
            role,
        });
    }

    pub fn peek_due(&self, now_ns: u64) -> Option<&DeferredEntry> {
        self.entries.front().filter(|e| e.due_ns <= now_ns)
    }

    pub fn pop_due(&mut self, now_ns: u64) -> Option<DeferredEntry> {
        self.peek_due(now_ns)?;
        self.entries.pop_front()
    }

    pub fn next_due_ns(&self) -> Option<u64> {
        self.entries.front().map(|e| e.due_ns)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
